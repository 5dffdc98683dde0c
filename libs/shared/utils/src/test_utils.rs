use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{Caller, Role, User};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::default()
        }
    }

    /// App config pointing at a mock PostgREST server.
    pub fn for_server(&self, server_uri: &str) -> AppConfig {
        AppConfig {
            supabase_url: server_uri.to_string(),
            ..self.to_app_config()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub role_id: i64,
}

impl TestUser {
    pub fn new(role: Role, role_id: i64) -> Self {
        let role_name = role.to_string();
        Self {
            id: format!("user-{}-{}", role_name.to_lowercase(), role_id),
            email: format!("{}{}@clinic.test", role_name.to_lowercase(), role_id),
            role: role_name,
            role_id,
        }
    }

    pub fn patient(patient_id: i64) -> Self {
        Self::new(Role::Patient, patient_id)
    }

    pub fn dentist(dentist_id: i64) -> Self {
        Self::new(Role::Dentist, dentist_id)
    }

    pub fn receptionist(staff_id: i64) -> Self {
        Self::new(Role::Receptionist, staff_id)
    }

    pub fn administrator(staff_id: i64) -> Self {
        Self::new(Role::Administrator, staff_id)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            role_id: Some(self.role_id),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn to_caller(&self) -> Caller {
        Caller::try_from(&self.to_user()).expect("test user has a known role")
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        Self::sign(
            json!({
                "sub": user.id,
                "email": user.email,
                "role": user.role,
                "role_id": user.role_id,
                "iat": now.timestamp(),
                "exp": exp.timestamp()
            }),
            secret,
        )
    }

    pub fn create_token_with_app_metadata(sub: &str, role: &str, role_id: i64, secret: &str) -> String {
        let now = Utc::now();
        Self::sign(
            json!({
                "sub": sub,
                "role": null,
                "app_metadata": { "role": role, "role_id": role_id },
                "iat": now.timestamp(),
                "exp": (now + Duration::hours(1)).timestamp()
            }),
            secret,
        )
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    fn sign(payload: Value, secret: &str) -> String {
        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }
}

/// PostgREST row fixtures shared by the cell test suites.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn patient_response(patient_id: i64, fullname: &str) -> Value {
        json!({
            "id": patient_id,
            "user_id": format!("user-patient-{}", patient_id),
            "fullname": fullname,
            "phone": "0900000000",
            "email": format!("patient{}@clinic.test", patient_id),
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn dentist_response(dentist_id: i64, fullname: &str, is_active: bool) -> Value {
        json!({
            "id": dentist_id,
            "user_id": format!("user-dentist-{}", dentist_id),
            "fullname": fullname,
            "phone": "0911111111",
            "email": format!("dentist{}@clinic.test", dentist_id),
            "is_active": is_active,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(
        appointment_id: i64,
        patient_id: i64,
        dentist_id: i64,
        date: &str,
        time: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": appointment_id,
            "patient_id": patient_id,
            "dentist_id": dentist_id,
            "date": date,
            "time": time,
            "status": status,
            "reason": "Check-up",
            "follow_up_of": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn notification_response(notification_id: i64, user_id: &str, is_read: bool) -> Value {
        json!({
            "id": notification_id,
            "user_id": user_id,
            "title": "Appointment booked",
            "message": "Your appointment has been booked",
            "category": "appointment",
            "related_object_id": 1,
            "is_read": is_read,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::dentist(5);
        assert_eq!(user.role, "Dentist");
        assert_eq!(user.id, "user-dentist-5");

        let caller = user.to_caller();
        assert_eq!(caller.role, Role::Dentist);
        assert_eq!(caller.role_id, 5);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::patient(10);
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));

        assert_eq!(token.split('.').count(), 3);
    }
}
