//! Student registry model
//!
//! Students are referenced by contracts but never owned by them: a student
//! record can outlive every contract that mentions it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A student eligible to hold a bed contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Unique student identifier (UUID)
    id: String,

    /// Full name
    full_name: String,

    /// Passport or national id document number
    passport: String,

    /// University the student is enrolled at
    university: String,

    /// Contact phone number
    phone: Option<String>,

    created_at: DateTime<Utc>,
}

impl Student {
    /// Register a new student
    pub fn new(
        full_name: String,
        passport: String,
        university: String,
        phone: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            full_name,
            passport,
            university,
            phone,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn passport(&self) -> &str {
        &self.passport
    }

    pub fn university(&self) -> &str {
        &self.university
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
