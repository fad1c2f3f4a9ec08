use sqlchain_core::sqlite::SqliteConnection;
use sqlchain_core::{insert, select, update, FetchMode};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== sqlchain SQLite - Usage Example ===\n");

    let conn = SqliteConnection::connect("sqlite::memory:")?;
    conn.run("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, status TEXT, score REAL)")?;

    for (name, status) in [("Ann", "active"), ("Bob", "active"), ("Cyd", "banned")] {
        let mut create = insert("users")
            .set("name", name)
            .set("status", status)
            .with_connection(conn.clone());
        create.execute().into_result()?;
        println!("1. Inserted {} as id {:?}", name, create.insert_id());
    }

    let mut active = select("users")
        .eq("status", "active")
        .order("name")
        .with_connection(conn.clone());
    println!("\n2. {}", active.render());
    active.execute().into_result()?;
    for row in active.rows(FetchMode::Assoc) {
        println!("   {}", row);
    }

    let mut ban = update("users")
        .set("status", "banned")
        .start_or()
        .eq("name", "Bob")
        .like("name", "zz")
        .end_or()
        .with_connection(conn.clone());
    ban.execute().into_result()?;
    println!("\n3. Banned {} row(s)", ban.row_count());

    let mut count = select("SELECT COUNT(*) FROM users")
        .eq("status", "banned")
        .with_connection(conn);
    count.execute().into_result()?;
    println!("\n4. Banned users: {:?}", count.single_item());

    Ok(())
}
