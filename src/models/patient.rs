//! Patient entity and its derived profile views.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;

/// Consecutive failed logins before the account locks.
pub const MAX_LOGIN_ATTEMPTS: i64 = 5;
/// Lock duration in minutes after too many failures.
pub const LOCK_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AsthmaSeverity {
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: String,
    #[serde(skip_serializing)]
    pub pin_hash: String,
    // Legacy password slot, populated with a random secret at registration.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub blood_type: Option<String>,
    pub asthma_severity: AsthmaSeverity,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub medical_notes: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,
    pub attending_doctor: Option<String>,
    pub attending_doctor_phone: Option<String>,
    pub asthma_specialist: Option<String>,
    pub asthma_specialist_phone: Option<String>,
    pub emergency_hospital: Option<String>,
    pub follow_up_hospital: Option<String>,
    pub insurance_number: Option<String>,
    pub phone_verified: bool,
    pub is_active_patient: bool,
    pub registration_date: DateTime<Utc>,
    pub pin_created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub login_attempts: i64,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.name, last),
            None => self.name.clone(),
        }
    }

    /// Whole years from birth date to today; None when the birth date is
    /// unknown or in the future.
    pub fn age(&self) -> Option<i64> {
        self.age_at(Utc::now().date_naive())
    }

    fn age_at(&self, today: NaiveDate) -> Option<i64> {
        self.birth_date
            .and_then(|birth| today.years_since(birth))
            .map(i64::from)
    }

    /// BMI = weight_kg / (height_cm / 100)^2, rounded to 2 decimals.
    /// None when either measurement is missing or the height is zero.
    pub fn bmi(&self) -> Option<f64> {
        match (self.height, self.weight) {
            (Some(height), Some(weight)) if height > 0.0 => {
                let meters = height / 100.0;
                Some((weight / (meters * meters) * 100.0).round() / 100.0)
            }
            _ => None,
        }
    }

    pub fn bmi_category(&self) -> Option<BmiCategory> {
        let bmi = self.bmi()?;
        Some(if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        })
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.locked_until, Some(until) if until > Utc::now())
    }

    pub fn remaining_attempts(&self) -> i64 {
        (MAX_LOGIN_ATTEMPTS - self.login_attempts).max(0)
    }

    fn emergency_contact(&self) -> Value {
        json!({
            "name": self.emergency_contact_name,
            "phone": self.emergency_contact_phone,
            "relationship": self.emergency_contact_relationship,
        })
    }

    fn medical_team(&self) -> Value {
        json!({
            "attending_doctor": {
                "name": self.attending_doctor,
                "phone": self.attending_doctor_phone,
            },
            "asthma_specialist": {
                "name": self.asthma_specialist,
                "phone": self.asthma_specialist_phone,
            },
        })
    }

    fn hospital_info(&self) -> Value {
        json!({
            "emergency": self.emergency_hospital,
            "follow_up": self.follow_up_hospital,
        })
    }

    /// Short view returned by register/login.
    pub fn summary(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "last_name": self.last_name,
            "full_name": self.full_name(),
            "phone": self.phone,
            "email": self.email,
            "gender": self.gender,
            "birth_date": self.birth_date,
            "age": self.age(),
            "asthma_severity": self.asthma_severity,
            "phone_verified": self.phone_verified,
            "is_active_patient": self.is_active_patient,
            "registration_date": self.registration_date,
            "last_login_at": self.last_login_at,
        })
    }

    /// Full profile view with derived attributes and aggregate sub-objects.
    pub fn profile(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "last_name": self.last_name,
            "full_name": self.full_name(),
            "phone": self.phone,
            "email": self.email,
            "gender": self.gender,
            "birth_date": self.birth_date,
            "age": self.age(),
            "height": self.height,
            "weight": self.weight,
            "bmi": self.bmi(),
            "bmi_category": self.bmi_category(),
            "blood_type": self.blood_type,
            "asthma_severity": self.asthma_severity,
            "allergies": self.allergies,
            "medical_history": self.medical_history,
            "current_medications": self.current_medications,
            "medical_notes": self.medical_notes,
            "emergency_contact": self.emergency_contact(),
            "medical_team": self.medical_team(),
            "hospital_info": self.hospital_info(),
            "insurance_number": self.insurance_number,
            "phone_verified": self.phone_verified,
            "is_active_patient": self.is_active_patient,
            "registration_date": self.registration_date,
            "last_login_at": self.last_login_at,
            "created_at": self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn patient(height: Option<f64>, weight: Option<f64>) -> Patient {
        Patient {
            id: 1,
            name: "Awa".into(),
            last_name: Some("Diop".into()),
            email: None,
            phone: "+221770000000".into(),
            pin_hash: String::new(),
            password_hash: String::new(),
            gender: None,
            birth_date: Some(NaiveDate::from_ymd_opt(1990, 6, 15).unwrap()),
            height,
            weight,
            blood_type: None,
            asthma_severity: AsthmaSeverity::Moderate,
            allergies: None,
            medical_history: None,
            current_medications: None,
            medical_notes: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            emergency_contact_relationship: None,
            attending_doctor: None,
            attending_doctor_phone: None,
            asthma_specialist: None,
            asthma_specialist_phone: None,
            emergency_hospital: None,
            follow_up_hospital: None,
            insurance_number: None,
            phone_verified: false,
            is_active_patient: true,
            registration_date: Utc::now(),
            pin_created_at: Utc::now(),
            last_login_at: None,
            login_attempts: 0,
            locked_until: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn bmi_reference_value() {
        let p = patient(Some(170.0), Some(70.0));
        assert_eq!(p.bmi(), Some(24.22));
        assert_eq!(p.bmi_category(), Some(BmiCategory::Normal));
    }

    #[test_case(None, Some(70.0) ; "missing height")]
    #[test_case(Some(170.0), None ; "missing weight")]
    #[test_case(Some(0.0), Some(70.0) ; "zero height")]
    fn bmi_null_when_measurement_missing(height: Option<f64>, weight: Option<f64>) {
        let p = patient(height, weight);
        assert_eq!(p.bmi(), None);
        assert_eq!(p.bmi_category(), None);
    }

    #[test_case(160.0, 45.0, BmiCategory::Underweight)]
    #[test_case(170.0, 70.0, BmiCategory::Normal)]
    #[test_case(170.0, 80.0, BmiCategory::Overweight)]
    #[test_case(170.0, 95.0, BmiCategory::Obese)]
    fn bmi_categories(height: f64, weight: f64, expected: BmiCategory) {
        let p = patient(Some(height), Some(weight));
        assert_eq!(p.bmi_category(), Some(expected));
    }

    #[test]
    fn age_is_whole_year_floor() {
        let p = patient(None, None);
        // Day before the 35th birthday.
        assert_eq!(p.age_at(NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()), Some(34));
        assert_eq!(p.age_at(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()), Some(35));
    }

    #[test]
    fn lock_state_depends_on_expiry() {
        let mut p = patient(None, None);
        assert!(!p.is_locked());
        p.locked_until = Some(Utc::now() + chrono::Duration::minutes(5));
        assert!(p.is_locked());
        p.locked_until = Some(Utc::now() - chrono::Duration::minutes(5));
        assert!(!p.is_locked());
    }

    #[test]
    fn summary_never_carries_credentials() {
        let mut p = patient(None, None);
        p.pin_hash = "secret-hash".into();
        p.password_hash = "other-secret".into();
        let rendered = p.summary().to_string();
        assert!(!rendered.contains("secret-hash"));
        assert!(!rendered.contains("other-secret"));
    }
}
