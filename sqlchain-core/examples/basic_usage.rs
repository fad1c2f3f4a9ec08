use sqlchain_core::{delete, insert, select, typed, update, ParamType};

fn main() {
    // SELECT with blank filters dropped and an OR group
    let search = select("users")
        .eq("status", "active")
        .eq("city", "")                      // blank, left out
        .start_or()
        .eq("role", "admin")
        .like("email", "@example.com")       // becomes %@example.com%
        .end_or()
        .eq_null("deleted_at")
        .order("name")
        .limit(10)
        .offset(20);

    println!("SELECT SQL: {}", search.render());
    for param in search.parameters() {
        println!("  {} = {}", param.token(), param.value);
    }

    // Subquery membership shares its parameters with the outer statement
    let teams = select("SELECT id FROM teams").eq("league", "east");
    let members = select("users").in_("team_id", &teams).not_in("id", vec![1, 2, 3]);
    println!("IN SQL: {}", members.render());

    // eq_die matches nothing when the value is missing
    let guarded = select("orders").eq_die("customer_id", "");
    println!("Guarded SQL: {}", guarded.render());

    // INSERT and UPDATE through SET assignments
    let create = insert("users")
        .set("name", "John Doe")
        .set("age", typed("30", ParamType::Int));
    println!("INSERT SQL: {}", create.render());

    let rename = update("users")
        .set("email", "newemail@example.com")
        .eq("id", 123)
        .eq("active", true);
    println!("UPDATE SQL: {}", rename.render());

    // DELETE with a group left open; rendering closes it
    let purge = delete("sessions")
        .start_or()
        .eq_null("user_id")
        .eq("expired", true);
    println!("DELETE SQL: {}", purge.render());
}
