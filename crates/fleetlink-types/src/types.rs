//! Entity records shared across the workspace

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Internal identifier of a driver
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(String);

/// Internal identifier of a vehicle
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Generate a fresh random identifier
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(DriverId);
string_id!(VehicleId);

/// A registered driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
    /// Unique across all drivers
    pub license_number: String,
    pub registered_at: DateTime<Utc>,
}

/// Fields supplied when creating or updating a driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverFields {
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
    pub license_number: String,
}

impl DriverFields {
    pub fn new(license_number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: None,
            license_number: license_number.into(),
        }
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    pub fn into_driver(self, id: DriverId) -> Driver {
        Driver {
            id,
            name: self.name,
            contact: self.contact,
            license_number: self.license_number,
            registered_at: Utc::now(),
        }
    }
}

/// A vehicle in the fleet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    /// Registration plate, unique across all vehicles (e.g. "KA-01-AB-1234")
    pub vehicle_number: String,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    pub registered_at: DateTime<Utc>,
}

/// Fields supplied when creating or updating a vehicle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleFields {
    pub vehicle_number: String,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
}

impl VehicleFields {
    pub fn new(vehicle_number: impl Into<String>) -> Self {
        Self {
            vehicle_number: vehicle_number.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, vehicle_type: impl Into<String>) -> Self {
        self.vehicle_type = Some(vehicle_type.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn into_vehicle(self, id: VehicleId) -> Vehicle {
        Vehicle {
            id,
            vehicle_number: self.vehicle_number,
            vehicle_type: self.vehicle_type,
            brand: self.brand,
            status: self.status,
            purchase_date: self.purchase_date,
            registered_at: Utc::now(),
        }
    }
}

/// Link between one driver and one vehicle
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Association {
    pub driver_id: DriverId,
    pub vehicle_id: VehicleId,
}

impl Association {
    pub fn new(driver_id: DriverId, vehicle_id: VehicleId) -> Self {
        Self {
            driver_id,
            vehicle_id,
        }
    }
}

/// Payment made to a driver on a given date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub driver_id: DriverId,
    pub date: NaiveDate,
    pub purpose: String,
    pub amount: f64,
}

/// Repair or running expense booked against a vehicle on a given date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repair {
    pub vehicle_id: VehicleId,
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
}

/// Driver together with the numbers of the vehicles assigned to them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverRoster {
    pub driver: Driver,
    pub vehicle_numbers: Vec<String>,
}

/// Vehicle together with the names of its assigned drivers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleRoster {
    pub vehicle: Vehicle,
    pub driver_names: Vec<String>,
}
