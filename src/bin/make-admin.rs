use linkmy_backend::{config::CONFIG, db};
use std::env;

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin make-admin <EMAIL> [--revoke]");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let mut email = None;
    let mut revoke = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--revoke" => revoke = true,
            "-h" | "--help" => usage(),
            _ if email.is_none() => email = Some(arg),
            _ => usage(),
        }
    }
    let email = email.unwrap_or_else(|| usage());

    let pool = match db::init_pool(&CONFIG.database).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    match db::repository::users::set_admin_by_email(&pool, &email, !revoke).await {
        Ok(true) if revoke => println!("Admin rights revoked for {}", email),
        Ok(true) => println!("{} is now an admin", email),
        Ok(false) => {
            eprintln!("No user with email {}", email);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error updating user: {}", e);
            std::process::exit(1);
        }
    }
}
