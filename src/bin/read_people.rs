use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use csvbind::csv_record;
use std::env;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

csv_record! {
    #[derive(Debug, Clone, Default)]
    pub struct ContactInfo {
        #[csv("Phone")]
        pub phone: String,
        #[csv("Street")]
        pub street: String,
        #[csv("Email")]
        pub email: Option<String>,
    }
}

csv_record! {
    #[derive(Debug, Clone, Default)]
    pub struct Person {
        #[csv("ID")]
        pub id: u32,
        #[csv("FirstName")]
        pub first_name: String,
        #[csv("LastName")]
        pub last_name: String,
        #[csv("Age")]
        pub age: u8,
        #[csv("Country")]
        pub country: String,
        #[csv("BirthDate")]
        pub birth_date: NaiveDateTime,
        #[csv("Added")]
        pub added: DateTime<Utc>,
        #[csv("Modified")]
        pub modified: Option<DateTime<Utc>>,
        #[csv(embedded)]
        pub contacts: ContactInfo,
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/person.csv".to_string());

    let persons: Vec<Person> =
        csvbind::read_file(&path, b';').with_context(|| format!("reading {}", path))?;
    info!(count = persons.len(), "loaded persons");

    for person in &persons {
        println!("{:?}", person);
    }
    Ok(())
}
