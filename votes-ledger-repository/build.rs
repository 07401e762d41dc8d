// PostgreSQL integration tests run only when a database is configured.
fn main() {
    println!("cargo::rustc-check-cfg=cfg(postgres_available)");
    println!("cargo::rerun-if-env-changed=DATABASE_URL");
    if std::env::var_os("DATABASE_URL").is_some() {
        println!("cargo::rustc-cfg=postgres_available");
    }
}
