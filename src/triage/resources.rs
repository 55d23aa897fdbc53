//! Hospital resource status.
//!
//! In-memory arena of hospitals and their departments. The arena itself
//! sits behind an `RwLock` (only registration mutates it); per-department
//! occupancy is an `AtomicU32` updated by compare-and-swap, so concurrent
//! admits never overshoot capacity and discharges never go below zero.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::CapacityLevel;

use super::messages::MessageTemplates;

/// Occupancy above which alternatives are suggested.
pub const NEAR_CAPACITY_PERCENT: f64 = 85.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error("Hospital not found: {0}")]
    HospitalNotFound(String),

    #[error("Department {department} not found in {hospital_id}")]
    DepartmentNotFound {
        hospital_id: String,
        department: String,
    },

    #[error("No beds available in {department} at {hospital_id}")]
    NoBedsAvailable {
        hospital_id: String,
        department: String,
    },

    #[error("No admitted patients to discharge from {department} at {hospital_id}")]
    NothingToDischarge {
        hospital_id: String,
        department: String,
    },

    #[error("Hospital already registered: {0}")]
    DuplicateHospital(String),

    #[error("Resource store lock poisoned")]
    LockFailed,
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

struct DepartmentBeds {
    name: String,
    capacity: u32,
    occupied: AtomicU32,
    ventilators: u32,
    monitors: u32,
    staff_on_duty: u32,
}

impl DepartmentBeds {
    fn new(name: &str, capacity: u32, available: u32, ventilators: u32, monitors: u32, staff: u32) -> Self {
        Self {
            name: name.to_string(),
            capacity,
            occupied: AtomicU32::new(capacity.saturating_sub(available)),
            ventilators,
            monitors,
            staff_on_duty: staff,
        }
    }

    fn snapshot(&self) -> DepartmentSnapshot {
        let occupied = self.occupied.load(Ordering::SeqCst);
        DepartmentSnapshot {
            department: self.name.clone(),
            capacity: self.capacity,
            occupied,
            beds_available: self.capacity.saturating_sub(occupied),
            ventilators: self.ventilators,
            monitors: self.monitors,
            staff_on_duty: self.staff_on_duty,
        }
    }
}

struct Hospital {
    id: String,
    name: String,
    is_primary: bool,
    distance_km: f64,
    departments: Vec<DepartmentBeds>,
}

impl Hospital {
    fn department(&self, name: &str) -> Option<&DepartmentBeds> {
        self.departments.iter().find(|d| d.name == name)
    }

    fn snapshot(&self) -> HospitalSnapshot {
        HospitalSnapshot {
            hospital_id: self.id.clone(),
            name: self.name.clone(),
            is_primary: self.is_primary,
            distance_km: self.distance_km,
            departments: self.departments.iter().map(DepartmentBeds::snapshot).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentSnapshot {
    pub department: String,
    pub capacity: u32,
    pub occupied: u32,
    pub beds_available: u32,
    pub ventilators: u32,
    pub monitors: u32,
    pub staff_on_duty: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalSnapshot {
    pub hospital_id: String,
    pub name: String,
    pub is_primary: bool,
    pub distance_km: f64,
    pub departments: Vec<DepartmentSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityAlternative {
    pub hospital_id: String,
    pub hospital_name: String,
    pub distance_km: f64,
    pub beds_available: u32,
    pub ventilators: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityStatus {
    pub hospital_id: String,
    pub department: String,
    pub status: CapacityLevel,
    pub occupancy_percent: u32,
    pub beds_available: u32,
    pub capacity: u32,
    pub alternatives: Vec<CapacityAlternative>,
    pub recommendation: String,
}

/// Hospital registration request. Totals are spread evenly across the
/// listed departments; the remainder goes to the first one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalRegistration {
    pub hospital_id: String,
    pub name: String,
    pub departments: Vec<String>,
    #[serde(default)]
    pub total_beds: u32,
    #[serde(default)]
    pub ventilators: u32,
    #[serde(default)]
    pub monitors: u32,
    #[serde(default)]
    pub icu_beds: u32,
    #[serde(default = "default_distance")]
    pub distance_km: f64,
}

fn default_distance() -> f64 {
    5.0
}

/// Read side consumed by the triage pipeline.
pub trait ResourceLookup: Send + Sync {
    fn capacity_status(&self, department: &str) -> Result<CapacityStatus, ResourceError>;
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Shared resource state. One instance per process, wrapped in `Arc`.
pub struct ResourceStore {
    hospitals: RwLock<Vec<Hospital>>,
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceStore {
    /// Store seeded with the default hospital network.
    pub fn new() -> Self {
        Self {
            hospitals: RwLock::new(default_hospitals()),
        }
    }

    pub fn empty() -> Self {
        Self {
            hospitals: RwLock::new(Vec::new()),
        }
    }

    /// Restore the default hospital network.
    pub fn reset(&self) -> Result<(), ResourceError> {
        let mut hospitals = self.hospitals.write().map_err(|_| ResourceError::LockFailed)?;
        *hospitals = default_hospitals();
        tracing::info!("Resource store reset to defaults");
        Ok(())
    }

    /// Point-in-time view of every hospital. Taken under the write lock so
    /// no admit or discharge interleaves with the copy.
    pub fn snapshot(&self) -> Result<Vec<HospitalSnapshot>, ResourceError> {
        let hospitals = self.hospitals.write().map_err(|_| ResourceError::LockFailed)?;
        Ok(hospitals.iter().map(Hospital::snapshot).collect())
    }

    pub fn primary_hospital_id(&self) -> Result<Option<String>, ResourceError> {
        let hospitals = self.hospitals.read().map_err(|_| ResourceError::LockFailed)?;
        Ok(hospitals
            .iter()
            .find(|h| h.is_primary)
            .or_else(|| hospitals.first())
            .map(|h| h.id.clone()))
    }

    /// Take one bed. Fails without side effects when the department is full.
    pub fn admit(
        &self,
        department: &str,
        hospital_id: &str,
    ) -> Result<DepartmentSnapshot, ResourceError> {
        let hospitals = self.hospitals.read().map_err(|_| ResourceError::LockFailed)?;
        let beds = find_department(&hospitals, hospital_id, department)?;

        beds.occupied
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |occupied| {
                (occupied < beds.capacity).then_some(occupied + 1)
            })
            .map_err(|_| ResourceError::NoBedsAvailable {
                hospital_id: hospital_id.to_string(),
                department: department.to_string(),
            })?;

        tracing::info!(hospital_id, department, "Patient admitted");
        Ok(beds.snapshot())
    }

    /// Free one bed. Fails without side effects when nobody is admitted.
    pub fn discharge(
        &self,
        department: &str,
        hospital_id: &str,
    ) -> Result<DepartmentSnapshot, ResourceError> {
        let hospitals = self.hospitals.read().map_err(|_| ResourceError::LockFailed)?;
        let beds = find_department(&hospitals, hospital_id, department)?;

        beds.occupied
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |occupied| {
                occupied.checked_sub(1)
            })
            .map_err(|_| ResourceError::NothingToDischarge {
                hospital_id: hospital_id.to_string(),
                department: department.to_string(),
            })?;

        tracing::info!(hospital_id, department, "Patient discharged");
        Ok(beds.snapshot())
    }

    pub fn register_hospital(&self, reg: HospitalRegistration) -> Result<HospitalSnapshot, ResourceError> {
        let mut hospitals = self.hospitals.write().map_err(|_| ResourceError::LockFailed)?;
        if hospitals.iter().any(|h| h.id == reg.hospital_id) {
            return Err(ResourceError::DuplicateHospital(reg.hospital_id));
        }

        let count = (reg.departments.len() as u32).max(1);
        let beds_per = reg.total_beds / count;
        let icu_per = reg.icu_beds / count;
        let departments = reg
            .departments
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let first = i == 0;
                let extra = |total: u32| if first { total % count } else { 0 };
                let capacity = beds_per + extra(reg.total_beds);
                let available = capacity.saturating_sub(icu_per).max(1).min(capacity);
                DepartmentBeds::new(
                    name,
                    capacity,
                    available,
                    reg.ventilators / count + extra(reg.ventilators),
                    reg.monitors / count + extra(reg.monitors),
                    (capacity / 3).max(2),
                )
            })
            .collect();

        let hospital = Hospital {
            id: reg.hospital_id,
            name: reg.name,
            is_primary: hospitals.is_empty(),
            distance_km: reg.distance_km,
            departments,
        };
        let snapshot = hospital.snapshot();
        hospitals.push(hospital);

        tracing::info!(hospital_id = %snapshot.hospital_id, "Hospital registered");
        Ok(snapshot)
    }

    pub fn unregister_hospital(&self, hospital_id: &str) -> Result<(), ResourceError> {
        let mut hospitals = self.hospitals.write().map_err(|_| ResourceError::LockFailed)?;
        let before = hospitals.len();
        hospitals.retain(|h| h.id != hospital_id);
        if hospitals.len() == before {
            return Err(ResourceError::HospitalNotFound(hospital_id.to_string()));
        }
        tracing::info!(hospital_id, "Hospital unregistered");
        Ok(())
    }

    /// Capacity of `department` at `hospital_id`, with nearby alternatives
    /// when it is full or near capacity.
    pub fn check_capacity_at(
        &self,
        department: &str,
        hospital_id: &str,
    ) -> Result<CapacityStatus, ResourceError> {
        let hospitals = self.hospitals.read().map_err(|_| ResourceError::LockFailed)?;
        let hospital = hospitals
            .iter()
            .find(|h| h.id == hospital_id)
            .ok_or_else(|| ResourceError::HospitalNotFound(hospital_id.to_string()))?;

        let (capacity, beds_available, occupancy) = match hospital.department(department) {
            Some(beds) => {
                let snap = beds.snapshot();
                let pct = f64::from(snap.occupied) / f64::from(snap.capacity.max(1)) * 100.0;
                (snap.capacity, snap.beds_available, pct)
            }
            None => (0, 0, 100.0),
        };

        let status = if beds_available == 0 {
            CapacityLevel::Full
        } else if occupancy > NEAR_CAPACITY_PERCENT {
            CapacityLevel::NearCapacity
        } else {
            CapacityLevel::Available
        };

        let alternatives: Vec<CapacityAlternative> = if status == CapacityLevel::Available {
            Vec::new()
        } else {
            hospitals
                .iter()
                .filter(|h| h.id != hospital.id)
                .filter_map(|h| {
                    let snap = h.department(department)?.snapshot();
                    (snap.beds_available > 0).then(|| CapacityAlternative {
                        hospital_id: h.id.clone(),
                        hospital_name: h.name.clone(),
                        distance_km: h.distance_km,
                        beds_available: snap.beds_available,
                        ventilators: snap.ventilators,
                    })
                })
                .collect()
        };

        if status != CapacityLevel::Available {
            tracing::warn!(
                hospital_id,
                department,
                status = status.as_str(),
                alternatives = alternatives.len(),
                "Department capacity constrained"
            );
        }

        Ok(CapacityStatus {
            hospital_id: hospital.id.clone(),
            department: department.to_string(),
            status,
            occupancy_percent: occupancy.round() as u32,
            beds_available,
            capacity,
            recommendation: MessageTemplates::capacity_recommendation(
                department,
                status,
                alternatives.len(),
            ),
            alternatives,
        })
    }
}

impl ResourceLookup for ResourceStore {
    /// Capacity at the primary hospital.
    fn capacity_status(&self, department: &str) -> Result<CapacityStatus, ResourceError> {
        let primary = self
            .primary_hospital_id()?
            .ok_or_else(|| ResourceError::HospitalNotFound("primary".to_string()))?;
        self.check_capacity_at(department, &primary)
    }
}

fn find_department<'a>(
    hospitals: &'a [Hospital],
    hospital_id: &str,
    department: &str,
) -> Result<&'a DepartmentBeds, ResourceError> {
    let hospital = hospitals
        .iter()
        .find(|h| h.id == hospital_id)
        .ok_or_else(|| ResourceError::HospitalNotFound(hospital_id.to_string()))?;
    hospital
        .department(department)
        .ok_or_else(|| ResourceError::DepartmentNotFound {
            hospital_id: hospital_id.to_string(),
            department: department.to_string(),
        })
}

/// `(name, capacity, available, ventilators, monitors, staff)`
type DepartmentSeed = (&'static str, u32, u32, u32, u32, u32);

fn hospital(id: &str, name: &str, is_primary: bool, distance_km: f64, seeds: &[DepartmentSeed]) -> Hospital {
    Hospital {
        id: id.to_string(),
        name: name.to_string(),
        is_primary,
        distance_km,
        departments: seeds
            .iter()
            .map(|&(dept, cap, avail, vent, mon, staff)| DepartmentBeds::new(dept, cap, avail, vent, mon, staff))
            .collect(),
    }
}

fn default_hospitals() -> Vec<Hospital> {
    vec![
        hospital(
            "HOSP-001",
            "City General Hospital",
            true,
            0.0,
            &[
                ("Emergency", 20, 8, 5, 15, 12),
                ("Cardiology", 15, 5, 3, 12, 8),
                ("Neurology", 12, 4, 2, 10, 6),
                ("Pulmonology", 10, 3, 6, 8, 5),
                ("Gastroenterology", 8, 4, 0, 6, 4),
                ("General Medicine", 30, 14, 2, 20, 15),
                ("Orthopedics", 10, 6, 0, 5, 5),
                ("Dermatology", 5, 4, 0, 2, 3),
            ],
        ),
        hospital(
            "HOSP-002",
            "St. Mary's Medical Center",
            false,
            3.2,
            &[
                ("Emergency", 15, 6, 4, 12, 10),
                ("Cardiology", 12, 7, 3, 10, 7),
                ("Neurology", 8, 5, 2, 6, 4),
                ("Pulmonology", 8, 4, 5, 6, 4),
                ("General Medicine", 25, 12, 2, 15, 10),
            ],
        ),
        hospital(
            "HOSP-003",
            "Regional Trauma Center",
            false,
            7.5,
            &[
                ("Emergency", 30, 15, 10, 25, 20),
                ("Cardiology", 10, 6, 2, 8, 5),
                ("Neurology", 10, 7, 3, 8, 5),
                ("Pulmonology", 12, 8, 8, 10, 6),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn default_network_has_primary() {
        let store = ResourceStore::new();
        assert_eq!(store.primary_hospital_id().unwrap().as_deref(), Some("HOSP-001"));
        let snap = store.snapshot().unwrap();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap[0].departments.len(), 8);
        let er = &snap[0].departments[0];
        assert_eq!((er.capacity, er.occupied, er.beds_available), (20, 12, 8));
    }

    #[test]
    fn capacity_available_in_primary() {
        let store = ResourceStore::new();
        let status = store.capacity_status("Emergency").unwrap();
        assert_eq!(status.status, CapacityLevel::Available);
        assert_eq!(status.occupancy_percent, 60);
        assert!(status.alternatives.is_empty());
        assert_eq!(status.recommendation, "Capacity is adequate in Emergency.");
    }

    #[test]
    fn full_department_lists_alternatives() {
        let store = ResourceStore::new();
        for _ in 0..3 {
            store.admit("Pulmonology", "HOSP-001").unwrap();
        }
        let err = store.admit("Pulmonology", "HOSP-001").unwrap_err();
        assert!(matches!(err, ResourceError::NoBedsAvailable { .. }));

        let status = store.capacity_status("Pulmonology").unwrap();
        assert_eq!(status.status, CapacityLevel::Full);
        assert_eq!(status.occupancy_percent, 100);
        let ids: Vec<_> = status.alternatives.iter().map(|a| a.hospital_id.as_str()).collect();
        assert_eq!(ids, vec!["HOSP-002", "HOSP-003"]);
    }

    #[test]
    fn near_capacity_above_threshold() {
        let store = ResourceStore::new();
        // Cardiology 15 beds, 10 occupied; 13 occupied is 86.7%.
        for _ in 0..3 {
            store.admit("Cardiology", "HOSP-001").unwrap();
        }
        let status = store.capacity_status("Cardiology").unwrap();
        assert_eq!(status.status, CapacityLevel::NearCapacity);
        assert!(!status.alternatives.is_empty());
    }

    #[test]
    fn missing_department_is_full() {
        let store = ResourceStore::new();
        let status = store.check_capacity_at("Dermatology", "HOSP-002").unwrap();
        assert_eq!(status.status, CapacityLevel::Full);
        assert_eq!(status.alternatives.len(), 1);
        assert_eq!(status.alternatives[0].hospital_id, "HOSP-001");
    }

    #[test]
    fn discharge_never_goes_negative() {
        let store = ResourceStore::new();
        // Dermatology starts with one occupied bed.
        store.discharge("Dermatology", "HOSP-001").unwrap();
        let err = store.discharge("Dermatology", "HOSP-001").unwrap_err();
        assert!(matches!(err, ResourceError::NothingToDischarge { .. }));
    }

    #[test]
    fn unknown_ids_are_reported() {
        let store = ResourceStore::new();
        assert_eq!(
            store.admit("Emergency", "HOSP-999").unwrap_err(),
            ResourceError::HospitalNotFound("HOSP-999".into())
        );
        assert!(matches!(
            store.admit("Oncology", "HOSP-001").unwrap_err(),
            ResourceError::DepartmentNotFound { .. }
        ));
    }

    #[test]
    fn concurrent_admits_never_exceed_capacity() {
        let store = Arc::new(ResourceStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..5)
                        .filter(|_| store.admit("Emergency", "HOSP-001").is_ok())
                        .count()
                })
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 8);

        let snap = store.snapshot().unwrap();
        assert_eq!(snap[0].departments[0].occupied, 20);
        assert_eq!(snap[0].departments[0].beds_available, 0);
    }

    #[test]
    fn concurrent_admit_and_discharge_stay_in_bounds() {
        let store = Arc::new(ResourceStore::new());
        let handles: Vec<_> = (0..6)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..50 {
                        if i % 2 == 0 {
                            let _ = store.admit("Neurology", "HOSP-001");
                        } else {
                            let _ = store.discharge("Neurology", "HOSP-001");
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let neuro = store.check_capacity_at("Neurology", "HOSP-001").unwrap();
        assert!(neuro.beds_available <= neuro.capacity);
    }

    #[test]
    fn register_and_unregister() {
        let store = ResourceStore::new();
        let snap = store
            .register_hospital(HospitalRegistration {
                hospital_id: "HOSP-010".into(),
                name: "Lakeside Clinic".into(),
                departments: vec!["Emergency".into(), "Cardiology".into()],
                total_beds: 11,
                ventilators: 3,
                monitors: 4,
                icu_beds: 2,
                distance_km: 4.0,
            })
            .unwrap();
        assert!(!snap.is_primary);
        assert_eq!(snap.departments[0].capacity, 6);
        assert_eq!(snap.departments[1].capacity, 5);
        assert_eq!(snap.departments[0].beds_available, 5);
        assert_eq!(snap.departments[0].ventilators, 2);

        let dup = store.register_hospital(HospitalRegistration {
            hospital_id: "HOSP-010".into(),
            name: "Again".into(),
            departments: vec![],
            total_beds: 0,
            ventilators: 0,
            monitors: 0,
            icu_beds: 0,
            distance_km: 1.0,
        });
        assert_eq!(dup.unwrap_err(), ResourceError::DuplicateHospital("HOSP-010".into()));

        store.unregister_hospital("HOSP-010").unwrap();
        assert!(store.unregister_hospital("HOSP-010").is_err());
    }

    #[test]
    fn reset_restores_defaults() {
        let store = ResourceStore::new();
        store.admit("Emergency", "HOSP-001").unwrap();
        store.reset().unwrap();
        let snap = store.snapshot().unwrap();
        assert_eq!(snap[0].departments[0].occupied, 12);
    }
}
