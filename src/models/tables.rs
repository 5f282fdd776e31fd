//! Raw input tables keyed by location and vehicle names.
//!
//! Column names follow the tabular interchange format (`LOCATION_NAME`,
//! `TIME_WINDOW_START`, ...). Rows carry no validation; that is done by
//! [`Network::build`](crate::network::Network::build).

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One depot. Only single-depot tables are accepted by the network builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DepotRow {
    pub location_name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub time_window_start: f64,
    pub time_window_end: f64,
}

/// One customer with its demand, stop time, and service window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CustomerRow {
    pub location_name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub time_window_start: f64,
    pub time_window_end: f64,
    pub demand: f64,
    pub stop_time: f64,
}

/// One directed entry of the transportation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TransitRow {
    pub from_location_name: String,
    pub to_location_name: String,
    pub drive_minutes: f64,
    pub transportation_cost: f64,
}

/// One vehicle of the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct VehicleRow {
    pub vehicle_name: String,
    pub capacity: f64,
    pub vehicle_fixed_cost: f64,
    /// Cost per driven minute.
    #[serde(default)]
    pub vehicle_variable_cost: f64,
}

/// The four input tables consumed by the network builder.
///
/// # Examples
///
/// ```
/// use u_cvrptw::models::InputTables;
///
/// let json = r#"{
///   "depots": [{"LOCATION_NAME": "D", "TIME_WINDOW_START": 0, "TIME_WINDOW_END": 100}],
///   "customers": [],
///   "transit": [],
///   "vehicles": [{"VEHICLE_NAME": "V1", "CAPACITY": 10, "VEHICLE_FIXED_COST": 0}]
/// }"#;
/// let tables = InputTables::from_json_reader(json.as_bytes()).unwrap();
/// assert_eq!(tables.depots[0].location_name, "D");
/// assert_eq!(tables.vehicles[0].vehicle_variable_cost, 0.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputTables {
    pub depots: Vec<DepotRow>,
    pub customers: Vec<CustomerRow>,
    pub transit: Vec<TransitRow>,
    pub vehicles: Vec<VehicleRow>,
}

impl InputTables {
    /// Reads all four tables from one JSON document.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Reads the tables from four CSV sources with header rows.
    pub fn from_csv_readers<D, C, T, V>(depots: D, customers: C, transit: T, vehicles: V) -> Result<Self>
    where
        D: Read,
        C: Read,
        T: Read,
        V: Read,
    {
        Ok(Self {
            depots: read_csv_rows(depots)?,
            customers: read_csv_rows(customers)?,
            transit: read_csv_rows(transit)?,
            vehicles: read_csv_rows(vehicles)?,
        })
    }

    /// Writes the tables as one pretty-printed JSON document.
    pub fn to_json_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Number of locations (depots plus customers).
    pub fn num_locations(&self) -> usize {
        self.depots.len() + self.customers.len()
    }
}

fn read_csv_rows<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
