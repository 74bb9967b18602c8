use marrow_core::{
    Connection, Error, FieldMap, Record, Repository, Result, Row, SqliteConnection, Value,
};

#[derive(Debug)]
struct User {
    id: Option<i64>,
    name: String,
    age: i64,
}

impl Record for User {
    const TABLE: &'static str = "users";
    const FIELDS: &'static [&'static str] = &["id", "name", "age"];

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get("id").and_then(Value::as_i64),
            name: row
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| Error::validation("users.name must be text"))?,
            age: row
                .get("age")
                .and_then(Value::as_i64)
                .ok_or_else(|| Error::validation("users.age must be an integer"))?,
        })
    }

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .set("id", self.id)
            .set("name", self.name.as_str())
            .set("age", self.age)
    }

    fn primary_key_value(&self) -> Value {
        self.id.into()
    }

    fn set_primary_key_value(&mut self, value: Value) {
        self.id = value.as_i64();
    }
}

fn main() -> Result<()> {
    let path = std::env::temp_dir().join("marrow_demo.db");
    let database = path.to_string_lossy().into_owned();

    // One-off schema setup through the raw connection interface
    let mut setup = SqliteConnection::new(&database);
    setup.connect()?;
    setup.execute(
        "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER NOT NULL)",
        &[],
    )?;
    setup.disconnect()?;

    let mut users: Repository<User> =
        Repository::with_connection(Box::new(SqliteConnection::new(&database)));

    let created = users.create(FieldMap::new().set("name", "Ann").set("age", 30))?;
    println!("created: {created:?}");

    let mut fetched = users
        .find_by_pk(created.id.unwrap())?
        .expect("row just inserted");
    fetched.age += 1;
    users.save(&mut fetched)?;

    for user in users.where_("age > ?", [18]).order_by_asc("name").fetch_all()? {
        println!("adult: {user:?}");
    }

    users.delete(&fetched)?;
    println!("remaining: {}", users.all()?.len());
    Ok(())
}
