//! JSON workloads over three document shapes of increasing size.

use crate::{
    benchmark::{BenchmarkConfig, BenchmarkRunner},
    cli::Suite,
    results::SuiteResults,
    utils::format_bytes,
};
use anyhow::Result;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleData {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Privacy {
    pub public: bool,
    pub friends: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub theme: String,
    pub notifications: bool,
    pub privacy: Privacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub age: u32,
    pub city: String,
    pub interests: Vec<String>,
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: u32,
    pub name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u32,
    pub product: String,
    pub price: f64,
    pub date: String,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediumData {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub profile: Profile,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Social {
    pub twitter: String,
    pub github: String,
    pub linkedin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub avatar: String,
    pub social: Social,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notifications {
    pub email: bool,
    pub push: bool,
    pub sms: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: String,
    pub language: String,
    pub notifications: Notifications,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetadata {
    pub ip: String,
    pub user_agent: String,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: String,
    pub metadata: ActivityMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub username: String,
    pub email: String,
    pub profile: UserProfile,
    pub preferences: Preferences,
    pub activity: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub version: String,
    pub generated: String,
    pub schema: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexData {
    pub metadata: DocumentMetadata,
    pub users: Vec<User>,
}

const MEDIUM_ORDERS: u32 = 100;
const COMPLEX_USERS: u32 = 1000;
const ACTIVITIES_PER_USER: u32 = 50;

fn rfc3339(at: chrono::DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn generate_simple_data() -> SimpleData {
    SimpleData {
        id: 1,
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        active: true,
    }
}

pub fn generate_medium_data() -> MediumData {
    let now = rfc3339(Utc::now());
    let orders = (0..MEDIUM_ORDERS)
        .map(|i| Order {
            id: i,
            product: format!("Product {}", i),
            price: f64::from(i) * 1.5,
            date: now.clone(),
            items: (0..(i % 5) + 1)
                .map(|j| OrderItem {
                    id: j,
                    name: format!("Item {}", j),
                    quantity: (j % 10) + 1,
                })
                .collect(),
        })
        .collect();

    MediumData {
        id: 1,
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        profile: Profile {
            age: 30,
            city: "New York".to_string(),
            interests: vec!["coding".into(), "music".into(), "travel".into()],
            settings: Settings {
                theme: "dark".to_string(),
                notifications: true,
                privacy: Privacy {
                    public: false,
                    friends: true,
                },
            },
        },
        orders,
    }
}

fn generate_user(i: u32, now: chrono::DateTime<Utc>) -> User {
    const ACTIVITY_KINDS: [&str; 4] = ["login", "logout", "purchase", "view"];
    const THEMES: [&str; 2] = ["light", "dark"];
    const LANGUAGES: [&str; 4] = ["en", "zh", "es", "fr"];

    let activity = (0..ACTIVITIES_PER_USER)
        .map(|j| Activity {
            id: j,
            kind: ACTIVITY_KINDS[(j % 4) as usize].to_string(),
            timestamp: rfc3339(now - ChronoDuration::hours(i64::from(j))),
            metadata: ActivityMetadata {
                ip: format!("192.168.1.{}", j % 255),
                user_agent: format!("Browser {}", j % 10),
                session_id: format!("session-{}-{}", i, j),
            },
        })
        .collect();

    User {
        id: i,
        username: format!("user{}", i),
        email: format!("user{}@example.com", i),
        profile: UserProfile {
            first_name: format!("First{}", i),
            last_name: format!("Last{}", i),
            bio: format!("This is a bio for user {}. {}", i, "Bio content. ".repeat(10)),
            avatar: format!("https://example.com/avatar/{}.jpg", i),
            social: Social {
                twitter: format!("@user{}", i),
                github: format!("user{}", i),
                linkedin: format!("user-{}", i),
            },
        },
        preferences: Preferences {
            theme: THEMES[(i % 2) as usize].to_string(),
            language: LANGUAGES[(i % 4) as usize].to_string(),
            notifications: Notifications {
                email: i % 2 == 0,
                push: i % 3 == 0,
                sms: i % 5 == 0,
            },
        },
        activity,
    }
}

pub fn generate_complex_data() -> ComplexData {
    let now = Utc::now();
    ComplexData {
        metadata: DocumentMetadata {
            version: "1.0.0".to_string(),
            generated: rfc3339(now),
            schema: "user-data-v1".to_string(),
        },
        users: (0..COMPLEX_USERS).map(|i| generate_user(i, now)).collect(),
    }
}

/// Serialization, deserialization and round-trip runs over one document
fn run_document<T>(
    kind: &str,
    data: &T,
    runner: &BenchmarkRunner,
    config: &BenchmarkConfig,
    results: &mut SuiteResults,
) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    info!("=== {} Data Structure ===", kind.to_uppercase());

    let outcome = runner.run_with(
        &format!("JSON Serialization ({})", kind),
        |data: &T| Ok(serde_json::to_string(data)?),
        data,
    )?;
    results.add_run(&outcome, &config.percentiles)?;
    let Some(json) = outcome.last_result else {
        anyhow::bail!("{} document could not be serialized", kind);
    };
    info!("JSON size: {} characters ({})", json.len(), format_bytes(json.len()));
    results.note(format!("JSON size: {} characters", json.len()));

    let outcome = runner.run_with(
        &format!("JSON Deserialization ({})", kind),
        |json: &str| Ok(serde_json::from_str::<T>(json).map(drop)?),
        json.as_str(),
    )?;
    results.add_run(&outcome, &config.percentiles)?;

    let outcome = runner.run_with(
        &format!("JSON Round-trip ({})", kind),
        |data: &T| {
            let json = serde_json::to_string(data)?;
            serde_json::from_str::<T>(&json)?;
            Ok(json.len())
        },
        data,
    )?;
    results.add_run(&outcome, &config.percentiles)?;

    Ok(())
}

/// Run the JSON suite
pub fn run_suite(config: &BenchmarkConfig) -> Result<SuiteResults> {
    let mut results = SuiteResults::new(Suite::Json);
    let runner = config.runner();

    run_document("simple", &generate_simple_data(), &runner, config, &mut results)?;
    run_document("medium", &generate_medium_data(), &runner, config, &mut results)?;
    run_document("complex", &generate_complex_data(), &runner, config, &mut results)?;

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_round_trip() {
        let data = generate_simple_data();
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(
            json,
            r#"{"id":1,"name":"Test User","email":"test@example.com","active":true}"#
        );
        assert_eq!(serde_json::from_str::<SimpleData>(&json).unwrap(), data);
    }

    #[test]
    fn test_medium_shape() {
        let data = generate_medium_data();
        assert_eq!(data.orders.len(), 100);
        assert_eq!(data.orders[0].items.len(), 1);
        assert_eq!(data.orders[4].items.len(), 5);
        assert_eq!(data.orders[5].items.len(), 1);
        assert_eq!(data.orders[99].price, 148.5);

        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(serde_json::from_str::<MediumData>(&json).unwrap(), data);
    }

    #[test]
    fn test_complex_shape() {
        let data = generate_complex_data();
        assert_eq!(data.users.len(), 1000);
        assert!(data.users.iter().all(|u| u.activity.len() == 50));

        let user = &data.users[7];
        assert_eq!(user.username, "user7");
        assert_eq!(user.preferences.theme, "dark");
        assert_eq!(user.preferences.language, "fr");
        assert_eq!(user.activity[2].kind, "purchase");
        assert_eq!(user.activity[2].metadata.session_id, "session-7-2");
    }

    #[test]
    fn test_activity_kind_serializes_as_type() {
        let user = generate_user(0, Utc::now());
        let value = serde_json::to_value(&user.activity[0]).unwrap();
        assert_eq!(value["type"], "login");
        assert!(value.get("kind").is_none());
    }
}
