//! Building the insert payload for a newly registered shipment.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::Rng;
use serde::Deserialize;
use shiptrack_protocol::NewShipment;

use crate::config::RegistrationConfig;
use crate::error::{Result, TrackError};

/// Sender, receiver and package details as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub sender_name: String,
    pub sender_email: String,
    pub sender_phone: String,
    pub sender_address: String,
    pub sender_city: String,
    pub sender_country: String,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    pub receiver_city: String,
    pub receiver_country: String,
    pub package_description: String,
    pub package_weight: String,
    pub package_value: String,
}

/// Joins the non-blank address parts with `", "`.
pub fn compose_address(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `<prefix><unix millis><0..1000>`.
pub fn generate_tracking_number<R: Rng + ?Sized>(
    prefix: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> String {
    let suffix: u32 = rng.gen_range(0..1000);
    format!("{}{}{}", prefix, now.timestamp_millis(), suffix)
}

/// Fails only when the delivery estimate falls outside chrono's date range.
pub fn build_new_shipment<R: Rng + ?Sized>(
    form: &RegistrationForm,
    owner_id: &str,
    now: DateTime<Utc>,
    config: &RegistrationConfig,
    rng: &mut R,
) -> Result<NewShipment> {
    let origin = compose_address(&[
        form.sender_address.as_str(),
        form.sender_city.as_str(),
        form.sender_country.as_str(),
    ]);
    let destination = compose_address(&[
        form.receiver_address.as_str(),
        form.receiver_city.as_str(),
        form.receiver_country.as_str(),
    ]);
    let days = config.delivery_estimate_days;
    let estimated_delivery = Duration::try_days(days)
        .and_then(|offset| now.checked_add_signed(offset))
        .ok_or(TrackError::DeliveryEstimateOutOfRange { days })?
        .format("%Y-%m-%d")
        .to_string();

    Ok(NewShipment {
        tracking_number: generate_tracking_number(&config.tracking_prefix, now, rng),
        user_id: owner_id.to_string(),
        status: config.initial_status.clone(),
        sender_name: form.sender_name.clone(),
        sender_email: form.sender_email.clone(),
        sender_phone: form.sender_phone.clone(),
        sender_address: form.sender_address.clone(),
        receiver_name: form.receiver_name.clone(),
        receiver_phone: form.receiver_phone.clone(),
        receiver_address: form.receiver_address.clone(),
        package_description: form.package_description.clone(),
        package_weight: form.package_weight.clone(),
        package_value: form.package_value.clone(),
        current_location: origin.clone(),
        origin,
        destination,
        estimated_delivery,
        last_updated: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-01T08:00:00Z")
            .expect("timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn compose_address_skips_blank_parts() {
        assert_eq!(compose_address(&["1 Main St", "", "  ", "USA"]), "1 Main St, USA");
        assert_eq!(compose_address(&["", ""]), "");
    }

    #[test]
    fn tracking_number_has_prefix_millis_and_suffix() {
        let mut rng = StdRng::seed_from_u64(7);
        let number = generate_tracking_number("ST", now(), &mut rng);
        let millis = now().timestamp_millis().to_string();

        assert!(number.starts_with(&format!("ST{}", millis)));
        let suffix: u32 = number[2 + millis.len()..].parse().expect("numeric suffix");
        assert!(suffix < 1000);
    }

    #[test]
    fn new_shipment_starts_at_origin() {
        let form = RegistrationForm {
            sender_name: "Ada".to_string(),
            sender_address: "1 Main St".to_string(),
            sender_city: "Austin".to_string(),
            sender_country: "USA".to_string(),
            receiver_address: "9 Elm St".to_string(),
            receiver_city: "Memphis".to_string(),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let shipment =
            build_new_shipment(&form, "user-1", now(), &RegistrationConfig::default(), &mut rng)
                .expect("new shipment");

        assert_eq!(shipment.status, "Registered");
        assert_eq!(shipment.origin, "1 Main St, Austin, USA");
        assert_eq!(shipment.current_location, shipment.origin);
        assert_eq!(shipment.destination, "9 Elm St, Memphis");
        assert_eq!(shipment.estimated_delivery, "2026-02-08");
        assert_eq!(shipment.last_updated, "2026-02-01T08:00:00.000Z");
        assert_eq!(shipment.user_id, "user-1");
        assert!(shipment.tracking_number.starts_with("ST"));
    }

    #[test]
    fn huge_delivery_estimate_is_an_error() {
        let config = RegistrationConfig {
            delivery_estimate_days: 100_000_000,
            ..RegistrationConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let err = build_new_shipment(&RegistrationForm::default(), "user-1", now(), &config, &mut rng)
            .expect_err("out of range");

        assert!(matches!(
            err,
            TrackError::DeliveryEstimateOutOfRange { days: 100_000_000 }
        ));
    }
}
