use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::Serialize;
use u_cvrptw::colgen::ColumnGeneration;
use u_cvrptw::config::Config;
use u_cvrptw::generator::{generate, GeneratorConfig};
use u_cvrptw::lp::MicroLpSolver;
use u_cvrptw::models::InputTables;
use u_cvrptw::solution::{RoutingPlan, StopRecord};

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) {
    let mut writer = csv::Writer::from_path(path).expect("create csv");
    for row in rows {
        writer.serialize(row).expect("serialize row");
    }
    writer.flush().expect("flush");
}

fn open(path: &Path) -> BufReader<File> {
    BufReader::new(File::open(path).expect("open"))
}

#[test]
fn test_json_tables_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tables.json");
    let tables = generate(&GeneratorConfig::new(5, 11)).expect("generate");

    tables.to_json_writer(BufWriter::new(File::create(&path).expect("create"))).expect("write");
    let back = InputTables::from_json_reader(open(&path)).expect("read");
    assert_eq!(back, tables);
}

#[test]
fn test_csv_tables_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tables = generate(&GeneratorConfig::new(4, 5)).expect("generate");
    let paths: Vec<_> = ["depots", "customers", "transit", "vehicles"]
        .iter()
        .map(|name| dir.path().join(format!("{name}.csv")))
        .collect();
    write_csv(&paths[0], &tables.depots);
    write_csv(&paths[1], &tables.customers);
    write_csv(&paths[2], &tables.transit);
    write_csv(&paths[3], &tables.vehicles);

    let back = InputTables::from_csv_readers(open(&paths[0]), open(&paths[1]), open(&paths[2]), open(&paths[3]))
        .expect("read");
    assert_eq!(back, tables);
    assert_eq!(back.num_locations(), 5);
}

#[test]
fn test_csv_header_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("customers.csv");
    std::fs::write(
        &path,
        "LOCATION_NAME,TIME_WINDOW_START,TIME_WINDOW_END,DEMAND,STOP_TIME\n C1 , 0, 50, 2, 5\n",
    )
    .expect("write");
    let depots = "LOCATION_NAME,TIME_WINDOW_START,TIME_WINDOW_END\nD,0,100\n";
    let transit = "FROM_LOCATION_NAME,TO_LOCATION_NAME,DRIVE_MINUTES,TRANSPORTATION_COST\n";
    let vehicles = "VEHICLE_NAME,CAPACITY,VEHICLE_FIXED_COST\nV1,10,0\n";

    let tables =
        InputTables::from_csv_readers(depots.as_bytes(), open(&path), transit.as_bytes(), vehicles.as_bytes())
            .expect("read");
    assert_eq!(tables.customers[0].location_name, "C1");
    assert_eq!(tables.customers[0].latitude, None);
    assert_eq!(tables.vehicles[0].vehicle_variable_cost, 0.0);
}

#[test]
fn test_plan_writers_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tables = generate(&GeneratorConfig::new(3, 2)).expect("generate");
    let outcome = ColumnGeneration::new(Config::default(), &MicroLpSolver)
        .run_tables(&tables)
        .expect("run");
    let plan = outcome.plan;

    let json_path = dir.path().join("plan.json");
    plan.write_json(File::create(&json_path).expect("create")).expect("write json");
    let back: RoutingPlan = serde_json::from_reader(open(&json_path)).expect("parse json");
    assert_eq!(back, plan);

    let csv_path = dir.path().join("plan.csv");
    plan.write_csv(File::create(&csv_path).expect("create")).expect("write csv");
    let mut reader = csv::Reader::from_path(&csv_path).expect("open csv");
    let records: Vec<StopRecord> = reader.deserialize().collect::<Result<_, _>>().expect("parse csv");
    let expected: Vec<StopRecord> = plan.stop_records().cloned().collect();
    assert_eq!(records, expected);
    assert!(records.iter().all(|r| r.stop_number > 0 || r.previous_location_name.is_none()));
}
