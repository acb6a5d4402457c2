use chrono::NaiveDate;
use safety_map_location_models::LocationId;
use safety_map_report_models::DateRange;
use safety_map_store::memory::MemoryStore;

/// CGK owns one sub-branch and two units; DPS, TKG and KNO have no
/// children. KNO's last report has a null category and status.
const DATASET: &str = r#"{
    "locations": [
        { "id": "CGK", "name": "Soekarno-Hatta", "city": "Tangerang", "provinsi": "Banten",
          "level": "cabang_utama", "coordinates": [-6.1256, 106.6559] },
        { "id": "CGK-P1", "name": "Pembantu Halim", "level": "cabang_pembantu", "parent_id": "CGK" },
        { "id": "CGK-U1", "name": "Unit Pondok Cabe", "level": "unit", "parent_id": "CGK" },
        { "id": "CGK-U2", "name": "Unit Curug", "level": "unit", "parent_id": "CGK" },
        { "id": "DPS", "name": "I Gusti Ngurah Rai", "level": "cabang_utama",
          "coordinates": [-8.7482, 115.1672] },
        { "id": "TKG", "name": "Radin Inten II", "level": "cabang_utama" },
        { "id": "KNO", "name": "Kualanamu", "level": "cabang_utama" }
    ],
    "reports": [
        { "id": 1, "airport_id": "CGK", "category": "Bird Strike", "report_date": "2023-11-15", "status": "Open" },
        { "id": 2, "airport_id": "CGK", "category": "FOD", "report_date": "2024-01-05 07:30:00", "status": "Open" },
        { "id": 3, "airport_id": "CGK", "category": "Bird Strike", "report_date": "2024-01-20", "status": "Analysis Completed" },
        { "id": 4, "airport_id": "CGK", "category": "", "report_date": "2024-03-02", "status": "Send to Analyst" },
        { "id": 5, "airport_id": "CGK-P1", "category": "FOD", "report_date": "2024-01-31", "status": "Open" },
        { "id": 6, "airport_id": "CGK-P1", "category": "fod", "report_date": "2024-02-01", "status": "Open" },
        { "id": 7, "airport_id": "CGK-U1", "category": "Runway Incursion", "report_date": "2024-03-31 23:59:00", "status": "Analysis On Process" },
        { "id": 8, "airport_id": "TKG", "category": "Bird Strike", "report_date": "2024-05-01", "status": "Open" },
        { "id": 9, "airport_id": "TKG", "category": "Bird Strike", "report_date": "2024-05-01", "status": "Open" },
        { "id": 10, "airport_id": "KNO", "category": "Laser Strike", "report_date": "2024-06-03", "status": "Open" },
        { "id": 11, "airport_id": "KNO", "category": "FOD", "report_date": "2024-06-10", "status": "Open" },
        { "id": 12, "airport_id": "KNO", "category": "Laser Strike", "report_date": "2024-06-17", "status": "Open" },
        { "id": 13, "airport_id": "KNO", "category": null, "report_date": "2024-07-01", "status": null }
    ]
}"#;

pub fn store() -> MemoryStore {
    MemoryStore::from_json_str(DATASET).unwrap()
}

pub fn id(id: &str) -> LocationId {
    LocationId::from(id)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange::new(start, end).unwrap()
}

/// January 2024, inclusive.
pub fn january() -> DateRange {
    range(date(2024, 1, 1), date(2024, 1, 31))
}
