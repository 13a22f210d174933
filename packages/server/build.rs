fn main() {
    // Re-embed migrations when they change (sqlx::migrate! macro).
    println!("cargo:rerun-if-changed=migrations");
}
