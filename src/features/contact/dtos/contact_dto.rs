use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request DTO for submitting a contact request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequestDto {
    #[validate(length(min = 1, max = 120, message = "El nombre debe tener entre 1 y 120 caracteres"))]
    pub name: String,

    #[validate(email(message = "El correo electrónico no es válido"))]
    pub email: String,

    #[validate(length(max = 30, message = "El teléfono no puede superar 30 caracteres"))]
    pub phone: Option<String>,

    #[validate(length(max = 120, message = "La empresa no puede superar 120 caracteres"))]
    pub company: Option<String>,

    #[validate(length(min = 1, max = 2000, message = "El mensaje debe tener entre 1 y 2000 caracteres"))]
    pub message: String,
}

/// Acknowledgement returned once a contact request has been handed off
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactReceiptDto {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dto(value: serde_json::Value) -> ContactRequestDto {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_request() {
        let request = dto(json!({
            "name": "Ana López",
            "email": "ana@empresa.mx",
            "company": "Empresa SA",
            "message": "Queremos mejorar nuestro proceso de reclutamiento."
        }));
        assert!(request.validate().is_ok());
        assert!(request.phone.is_none());
    }

    #[test]
    fn test_rejects_bad_email_and_empty_message() {
        let request = dto(json!({
            "name": "Ana",
            "email": "no-es-correo",
            "message": ""
        }));
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("message"));
        assert!(!fields.contains_key("name"));
    }

    #[test]
    fn test_rejects_long_phone() {
        let request = dto(json!({
            "name": "Ana",
            "email": "ana@empresa.mx",
            "phone": "5".repeat(31),
            "message": "Hola"
        }));
        assert!(request.validate().unwrap_err().field_errors().contains_key("phone"));
    }
}
