use chrono::{Duration, Months, NaiveDate, Utc};
use models::schemas::ContactCreate;
use rand::seq::SliceRandom;
use rand::Rng;
use service::contacts::ContactService;
use service::errors::ServiceError;
use tracing::{info, warn};

const FIRST_NAMES: &[&str] = &[
    "Olivia", "Liam", "Emma", "Noah", "Ava", "Oliver", "Sophia", "Elijah", "Mia", "James",
    "Amelia", "Lucas", "Harper", "Mason", "Evelyn", "Ethan",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Martinez",
    "Lopez", "Wilson", "Anderson", "Taylor", "Thomas", "Moore",
];

const DOMAINS: &[&str] = &["example.com", "example.org", "mail.test"];

fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or("Contact")
}

/// A birth date for someone between 18 and 45 years old today.
fn birth_date<R: Rng>(rng: &mut R, today: NaiveDate) -> Option<NaiveDate> {
    let age: u32 = rng.gen_range(18..=45);
    let anniversary = today.checked_sub_months(Months::new(age * 12))?;
    anniversary.checked_sub_signed(Duration::days(rng.gen_range(0..365)))
}

fn fake_contact<R: Rng>(rng: &mut R, today: NaiveDate) -> Option<ContactCreate> {
    let first = pick(rng, FIRST_NAMES);
    let last = pick(rng, LAST_NAMES);
    let email = format!(
        "{}.{}{}@{}",
        first.to_lowercase(),
        last.to_lowercase(),
        rng.gen_range(1..1000),
        pick(rng, DOMAINS)
    );
    let phone = format!("+1-555-{:03}-{:04}", rng.gen_range(0..1000), rng.gen_range(0..10000));
    Some(ContactCreate {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email,
        phone,
        birth_date: birth_date(rng, today)?,
        notes: None,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    common::utils::logging::init_logging_from_env();

    let cfg = server::startup::load_config()?;
    let repo = server::startup::contact_repository(&cfg).await?;
    let contacts = ContactService::new(repo);

    let today = Utc::now().date_naive();
    let batch: Vec<ContactCreate> = {
        let mut rng = rand::thread_rng();
        let n = rng.gen_range(10..=15);
        (0..n).filter_map(|_| fake_contact(&mut rng, today)).collect()
    };

    let mut created = 0usize;
    for input in batch {
        match contacts.create(input).await {
            Ok(c) => {
                created += 1;
                info!(id = c.id, email = %c.email, "seeded contact");
            }
            Err(ServiceError::Conflict(msg)) => warn!(%msg, "skipping duplicate contact"),
            Err(e) => return Err(e.into()),
        }
    }

    info!(created, "database seeded");
    Ok(())
}
