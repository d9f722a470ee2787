//! Booking request and outcome types

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One online booking: a single appointment plus the client's contacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Appointment id within the booking (client-chosen)
    pub booking_id: u64,
    /// Client full name
    pub fullname: String,
    /// Client phone
    pub phone: String,
    /// Client email
    pub email: String,
    /// Service to book
    pub service_id: u64,
    /// Staff member; `None` lets the salon choose
    #[serde(default)]
    pub staff_id: Option<u64>,
    /// Appointment start, ISO-8601
    pub datetime: String,
    /// Free-text comment
    #[serde(default)]
    pub comment: Option<String>,
}

impl BookingRequest {
    /// Request with the required fields; no staff preference, no comment
    pub fn new(
        booking_id: u64,
        fullname: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
        service_id: u64,
        datetime: impl Into<String>,
    ) -> Self {
        Self {
            booking_id,
            fullname: fullname.into(),
            phone: phone.into(),
            email: email.into(),
            service_id,
            staff_id: None,
            datetime: datetime.into(),
            comment: None,
        }
    }

    /// Prefer a staff member
    #[must_use]
    pub fn staff(mut self, staff_id: u64) -> Self {
        self.staff_id = Some(staff_id);
        self
    }

    /// Attach a comment
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// JSON body of the `book_record` call
    pub fn payload(&self) -> Value {
        json!({
            "phone": self.phone,
            "fullname": self.fullname,
            "email": self.email,
            "comment": self.comment,
            "notify_by_email": 0,
            "appointments": [{
                "id": self.booking_id,
                "services": [self.service_id],
                "staff_id": self.staff_id.unwrap_or(0),
                "datetime": self.datetime,
            }],
        })
    }
}

/// Result of a booking call
///
/// A rejection by the service is data, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingOutcome {
    /// Whether the booking was accepted
    pub success: bool,
    /// Rejection message; empty on success
    pub message: String,
}

impl BookingOutcome {
    /// Accepted booking
    pub fn accepted() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    /// Rejected booking
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Interpret a decoded `book_record` response
    ///
    /// The booking failed when the body is an object with a truthy `errors`
    /// key; the message is taken from `errors.message` when present.
    pub fn from_response(body: &Value) -> Self {
        match body.get("errors") {
            Some(errors) if is_truthy(errors) => {
                let message = errors
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Self::rejected(message)
            }
            _ => Self::accepted(),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
