use crate::record::CandidateRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A wanted person as persisted in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WantedPerson {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<String>,
    pub crime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuing_unit: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WantedPerson {
    /// Builds a new entity from a candidate with a fresh id and the current time
    pub fn from_candidate(candidate: &CandidateRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: candidate.name.clone(),
            birth_year: candidate.birth_year,
            address: candidate.address.clone(),
            parents: candidate.parents.clone(),
            crime: candidate.crime.clone(),
            decision_number: candidate.decision_number.clone(),
            issuing_unit: candidate.issuing_unit.clone(),
            created_at: Utc::now(),
        }
    }

    /// Overwrites every field the candidate carries, keeping the rest
    ///
    /// Identity and creation time never change.
    pub fn merge(&mut self, candidate: &CandidateRecord) {
        self.name.clone_from(&candidate.name);
        self.crime.clone_from(&candidate.crime);

        if let Some(year) = candidate.birth_year {
            self.birth_year = Some(year);
        }
        merge_field(&mut self.address, &candidate.address);
        merge_field(&mut self.parents, &candidate.parents);
        merge_field(&mut self.decision_number, &candidate.decision_number);
        merge_field(&mut self.issuing_unit, &candidate.issuing_unit);
    }

    /// True when both name and crime are exactly equal
    pub fn same_name_and_crime(&self, name: &str, crime: &str) -> bool {
        self.name == name && self.crime == crime
    }
}

fn merge_field(target: &mut Option<String>, incoming: &Option<String>) {
    if let Some(value) = incoming {
        *target = Some(value.clone());
    }
}

impl From<&WantedPerson> for CandidateRecord {
    fn from(person: &WantedPerson) -> Self {
        Self {
            name: person.name.clone(),
            birth_year: person.birth_year,
            address: person.address.clone(),
            parents: person.parents.clone(),
            crime: person.crime.clone(),
            decision_number: person.decision_number.clone(),
            issuing_unit: person.issuing_unit.clone(),
        }
    }
}
