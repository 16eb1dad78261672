//! The per-resource repository: one owned collection of readings plus the
//! tariff settings, with every mutation funneled through the recalculator.
//!
//! Replaces the original app's process-wide stores: a `MeterStore` is an
//! explicit value passed to whoever needs it, and readers only ever see a
//! fully consistent collection because mutations swap the whole vector for
//! the recalculator's output.

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::schema::ResourceSchema;
use crate::types::{
    MeterlogError, Reading, ReadingInput, ResourceKind, Result, TariffPeriod, TariffRates,
    TariffSettings,
};

use super::calculator::compute_reading;
use super::recalculator::recalculate_all;

pub struct MeterStore {
    schema: &'static ResourceSchema,
    /// Invariant: sorted by date ascending with consistent derived fields
    readings: Vec<Reading>,
    tariff: TariffSettings,
}

impl MeterStore {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            schema: kind.schema(),
            readings: Vec::new(),
            tariff: TariffSettings::default(),
        }
    }

    /// Reassemble a store from persisted parts. The parts are trusted to
    /// satisfy the collection invariant (they come from our own save).
    pub fn from_parts(kind: ResourceKind, readings: Vec<Reading>, tariff: TariffSettings) -> Self {
        Self {
            schema: kind.schema(),
            readings,
            tariff,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.schema.kind
    }

    pub fn schema(&self) -> &'static ResourceSchema {
        self.schema
    }

    /// All readings, date ascending, derived fields consistent.
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn tariff(&self) -> &TariffSettings {
        &self.tariff
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn get(&self, id: Uuid) -> Option<&Reading> {
        self.readings.iter().find(|r| r.id == id)
    }

    /// Chronologically latest reading.
    pub fn last_reading(&self) -> Option<&Reading> {
        self.readings.last()
    }

    /// Latest reading strictly before `date`.
    pub fn prev_reading_for(&self, date: NaiveDate) -> Option<&Reading> {
        self.readings.iter().filter(|r| r.date < date).next_back()
    }

    /// Compute and insert a new reading, then rebase the collection.
    ///
    /// The tariff is resolved from history for the reading's date and
    /// embedded as its snapshot. Returns the stored (post-recalculation)
    /// record.
    pub fn add_reading(&mut self, input: ReadingInput) -> Result<Reading> {
        if self.readings.iter().any(|r| r.date == input.date) {
            return Err(MeterlogError::DuplicateDate(input.date));
        }
        let rates = self.tariff.rates_for_date(input.date);
        let reading = compute_reading(self.schema, &input, self.prev_reading_for(input.date), &rates);
        let id = reading.id;

        let mut all = std::mem::take(&mut self.readings);
        all.push(reading);
        self.readings = recalculate_all(self.schema, all);

        debug!(resource = %self.kind(), date = %input.date, "added reading");
        Ok(self.stored(id))
    }

    /// Replace a record's date, raw values and note, re-snapshot its
    /// tariff for the (possibly new) date, then rebase the collection.
    pub fn update_reading(&mut self, id: Uuid, input: ReadingInput) -> Result<Reading> {
        if self.get(id).is_none() {
            return Err(MeterlogError::UnknownReading(id));
        }
        if self
            .readings
            .iter()
            .any(|r| r.date == input.date && r.id != id)
        {
            return Err(MeterlogError::DuplicateDate(input.date));
        }
        let rates = self.tariff.rates_for_date(input.date);

        let mut all = std::mem::take(&mut self.readings);
        for r in &mut all {
            if r.id == id {
                r.date = input.date;
                r.values = input.values.clone();
                r.note = input.note.clone();
                r.tariff_snapshot = rates.clone();
            }
        }
        self.readings = recalculate_all(self.schema, all);

        debug!(resource = %self.kind(), date = %input.date, "updated reading");
        Ok(self.stored(id))
    }

    /// Remove a record; its successor rebases onto the record before it.
    pub fn delete_reading(&mut self, id: Uuid) -> Result<()> {
        if self.get(id).is_none() {
            return Err(MeterlogError::UnknownReading(id));
        }
        let all = std::mem::take(&mut self.readings);
        let remaining: Vec<Reading> = all.into_iter().filter(|r| r.id != id).collect();
        self.readings = recalculate_all(self.schema, remaining);

        debug!(resource = %self.kind(), %id, "deleted reading");
        Ok(())
    }

    pub fn clear_readings(&mut self) {
        self.readings.clear();
    }

    /// Record a rate change and make it current. History is append-only.
    pub fn set_tariff(&mut self, rates: TariffRates, start_date: NaiveDate) -> &TariffPeriod {
        info!(resource = %self.kind(), %start_date, "tariff period appended");
        self.tariff.append_period(rates, start_date)
    }

    /// Swap in imported readings, re-deriving everything instead of
    /// trusting the document's embedded consumption/cost fields.
    pub fn replace_readings(&mut self, readings: Vec<Reading>) {
        let count = readings.len();
        self.readings = recalculate_all(self.schema, readings);
        info!(resource = %self.kind(), count, "collection replaced");
    }

    pub fn set_tariff_settings(&mut self, tariff: TariffSettings) {
        self.tariff = tariff;
    }

    fn stored(&self, id: Uuid) -> Reading {
        self.get(id)
            .cloned()
            .expect("record present after recalculation")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn gas_store(rate: f64) -> MeterStore {
        let mut store = MeterStore::new(ResourceKind::Gas);
        store.set_tariff(TariffRates::from_pairs([("gas", rate)]), date(2020, 1, 1));
        store
    }

    fn gas_input(d: NaiveDate, raw: f64) -> ReadingInput {
        ReadingInput::new(d, BTreeMap::from([("gas".to_string(), raw)]), "")
    }

    #[test]
    fn test_add_first_reading() {
        let mut store = gas_store(5.0);
        let r = store.add_reading(gas_input(date(2024, 1, 1), 100.0)).unwrap();
        assert_eq!(r.consumption_for("gas"), 0.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_chains_consumption() {
        let mut store = gas_store(5.0);
        store.add_reading(gas_input(date(2024, 1, 1), 100.0)).unwrap();
        let r = store.add_reading(gas_input(date(2024, 1, 8), 110.0)).unwrap();
        assert!((r.consumption_for("gas") - 10.0).abs() < 1e-9);
        assert!((r.total_cost - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_duplicate_date_rejected() {
        let mut store = gas_store(5.0);
        store.add_reading(gas_input(date(2024, 1, 1), 100.0)).unwrap();
        let err = store.add_reading(gas_input(date(2024, 1, 1), 110.0));
        assert!(matches!(err, Err(MeterlogError::DuplicateDate(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_backdated_insert_ripples_forward() {
        let mut store = gas_store(5.0);
        store.add_reading(gas_input(date(2024, 1, 1), 100.0)).unwrap();
        store.add_reading(gas_input(date(2024, 1, 3), 150.0)).unwrap();
        // backdated insert between the two
        let inserted = store.add_reading(gas_input(date(2024, 1, 2), 120.0)).unwrap();
        assert!((inserted.consumption_for("gas") - 20.0).abs() < 1e-9);

        let day3 = store.prev_reading_for(date(2024, 1, 4)).unwrap();
        assert_eq!(day3.date, date(2024, 1, 3));
        assert!((day3.consumption_for("gas") - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_uses_tariff_for_reading_date() {
        let mut store = gas_store(5.0);
        store.set_tariff(TariffRates::from_pairs([("gas", 8.0)]), date(2024, 6, 1));
        // reading dated before the raise gets the old rate
        let r = store.add_reading(gas_input(date(2024, 3, 1), 10.0)).unwrap();
        assert_eq!(r.tariff_snapshot.rate("gas"), 5.0);
        let r = store.add_reading(gas_input(date(2024, 7, 1), 20.0)).unwrap();
        assert_eq!(r.tariff_snapshot.rate("gas"), 8.0);
    }

    #[test]
    fn test_tariff_edit_does_not_rewrite_history() {
        let mut store = gas_store(5.0);
        store.add_reading(gas_input(date(2024, 1, 1), 0.0)).unwrap();
        let before = store
            .add_reading(gas_input(date(2024, 2, 1), 10.0))
            .unwrap();
        assert!((before.total_cost - 50.0).abs() < 1e-9);

        // raising the tariff later leaves stored costs alone,
        // even after an unrelated mutation recalculates the collection
        store.set_tariff(TariffRates::from_pairs([("gas", 9.0)]), date(2023, 1, 1));
        store.add_reading(gas_input(date(2024, 3, 1), 30.0)).unwrap();

        let feb = store.prev_reading_for(date(2024, 2, 15)).unwrap();
        assert!((feb.total_cost - 50.0).abs() < 1e-9);
        assert_eq!(feb.tariff_snapshot.rate("gas"), 5.0);
    }

    #[test]
    fn test_update_moves_reading_and_resnapshots() {
        let mut store = gas_store(5.0);
        store.add_reading(gas_input(date(2024, 1, 1), 100.0)).unwrap();
        let r = store.add_reading(gas_input(date(2024, 1, 10), 120.0)).unwrap();

        store.set_tariff(TariffRates::from_pairs([("gas", 6.0)]), date(2024, 1, 5));
        let updated = store
            .update_reading(r.id, gas_input(date(2024, 1, 12), 125.0))
            .unwrap();

        assert_eq!(updated.date, date(2024, 1, 12));
        assert!((updated.consumption_for("gas") - 25.0).abs() < 1e-9);
        assert_eq!(updated.tariff_snapshot.rate("gas"), 6.0);
        assert!((updated.total_cost - 150.0).abs() < 1e-9);
        assert_eq!(updated.id, r.id);
    }

    #[test]
    fn test_update_unknown_id() {
        let mut store = gas_store(5.0);
        let err = store.update_reading(Uuid::new_v4(), gas_input(date(2024, 1, 1), 1.0));
        assert!(matches!(err, Err(MeterlogError::UnknownReading(_))));
    }

    #[test]
    fn test_update_into_occupied_date_rejected() {
        let mut store = gas_store(5.0);
        store.add_reading(gas_input(date(2024, 1, 1), 100.0)).unwrap();
        let r = store.add_reading(gas_input(date(2024, 1, 2), 110.0)).unwrap();
        let err = store.update_reading(r.id, gas_input(date(2024, 1, 1), 110.0));
        assert!(matches!(err, Err(MeterlogError::DuplicateDate(_))));
    }

    #[test]
    fn test_delete_middle_rebases_successor() {
        let mut store = gas_store(5.0);
        store.add_reading(gas_input(date(2024, 1, 1), 0.0)).unwrap();
        let middle = store.add_reading(gas_input(date(2024, 1, 2), 10.0)).unwrap();
        store.add_reading(gas_input(date(2024, 1, 3), 25.0)).unwrap();

        store.delete_reading(middle.id).unwrap();
        assert_eq!(store.len(), 2);
        let last = store.last_reading().unwrap();
        assert!((last.consumption_for("gas") - 25.0).abs() < 1e-9);
        assert!((last.total_cost - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_delete_unknown_id() {
        let mut store = gas_store(5.0);
        assert!(matches!(
            store.delete_reading(Uuid::new_v4()),
            Err(MeterlogError::UnknownReading(_))
        ));
    }

    #[test]
    fn test_prev_reading_for_is_strictly_before() {
        let mut store = gas_store(5.0);
        store.add_reading(gas_input(date(2024, 1, 1), 100.0)).unwrap();
        store.add_reading(gas_input(date(2024, 1, 10), 110.0)).unwrap();

        assert_eq!(
            store.prev_reading_for(date(2024, 1, 10)).unwrap().date,
            date(2024, 1, 1)
        );
        assert_eq!(
            store.prev_reading_for(date(2024, 1, 11)).unwrap().date,
            date(2024, 1, 10)
        );
        assert!(store.prev_reading_for(date(2024, 1, 1)).is_none());
    }

    #[test]
    fn test_replace_readings_rederives_fields() {
        let mut store = gas_store(5.0);
        // tampered import: absurd derived fields that must not survive
        let tampered = Reading {
            id: Uuid::new_v4(),
            date: date(2024, 1, 2),
            values: BTreeMap::from([("gas".to_string(), 10.0)]),
            consumption: BTreeMap::from([("gas".to_string(), 999.0)]),
            costs: BTreeMap::from([("gas".to_string(), 9999.0)]),
            total_cost: 9999.0,
            tariff_snapshot: TariffRates::from_pairs([("gas", 5.0)]),
            note: String::new(),
            created_at: chrono::Utc::now(),
        };
        let first = Reading {
            id: Uuid::new_v4(),
            date: date(2024, 1, 1),
            values: BTreeMap::from([("gas".to_string(), 0.0)]),
            consumption: BTreeMap::new(),
            costs: BTreeMap::new(),
            total_cost: 0.0,
            tariff_snapshot: TariffRates::from_pairs([("gas", 5.0)]),
            note: String::new(),
            created_at: chrono::Utc::now(),
        };

        store.replace_readings(vec![tampered, first]);
        let last = store.last_reading().unwrap();
        assert!((last.consumption_for("gas") - 10.0).abs() < 1e-9);
        assert!((last.total_cost - 50.0).abs() < 1e-9);
    }
}
