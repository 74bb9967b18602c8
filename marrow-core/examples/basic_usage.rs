use marrow_core::{table, FieldMap, SortDirection};

fn main() {
    // SELECT with predicates, ordering and paging
    let select = table("users")
        .select(["id", "name", "email"])
        .where_("age > ?", [18])
        .where_("status = ?", ["active"])
        .order_by("name", SortDirection::Asc)
        .limit(10)
        .offset(5);
    let (sql, params) = select.render().unwrap();
    println!("SELECT SQL: {sql} (params: {params:?})");

    // INSERT from an ordered field map
    let insert = table("users").insert(
        FieldMap::new()
            .set("name", "John Doe")
            .set("email", "john@example.com")
            .set("age", 30),
    );
    let (sql, params) = insert.render().unwrap();
    println!("INSERT SQL: {sql} (params: {params:?})");

    // Multi-row INSERT with a uniform column shape
    let bulk = table("users")
        .insert_many(vec![
            FieldMap::new().set("name", "Ann").set("age", 31),
            FieldMap::new().set("name", "Bea").set("age", 28),
        ])
        .unwrap();
    let (sql, params) = bulk.render().unwrap();
    println!("BULK INSERT SQL: {sql} (params: {params:?})");

    // UPDATE with a raw SET fragment; SET values precede WHERE values
    let update = table("users")
        .update("email = ?, last_login = ?", ["new@example.com", "2024-01-15"])
        .where_("id = ?", [123]);
    let (sql, params) = update.render().unwrap();
    println!("UPDATE SQL: {sql} (params: {params:?})");

    // DELETE requires a predicate unless explicitly unrestricted
    let delete = table("users").delete().where_("age < ?", [13]);
    let (sql, params) = delete.render().unwrap();
    println!("DELETE SQL: {sql} (params: {params:?})");
}
