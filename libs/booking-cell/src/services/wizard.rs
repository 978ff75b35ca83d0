// libs/booking-cell/src/services/wizard.rs
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, error, info, warn};

use availability_cell::{BookingWindow, SlotQuery, SlotQuerySequencer, SlotResolution};
use shared_models::{BookingId, HospitalId, PetId, VeterinarianId};

use crate::error::{SubmissionError, ValidationError, ValidationIssue, WizardError};
use crate::models::{
    Advance, AppliedSlots, Retreat, ServiceType, StepId, SubmissionState, WizardSelection,
    WizardState,
};
use crate::services::submission::BookingRequestBuilder;
use crate::services::validation::ValidationGate;

/// State machine for one booking attempt at one hospital.
///
/// The wizard never touches the network. Setters that need fresh availability
/// hand back a [`SlotQuery`]; the caller resolves it and feeds the result to
/// [`BookingWizard::apply_slot_resolution`], which drops anything that is no
/// longer the latest query.
pub struct BookingWizard {
    hospital_id: HospitalId,
    window: BookingWindow,
    state: WizardState,
    sequencer: SlotQuerySequencer,
    slots: Option<AppliedSlots>,
    cancelled: bool,
}

impl BookingWizard {
    pub fn new(hospital_id: HospitalId, window: BookingWindow) -> Self {
        debug!("Opening booking wizard for hospital {}", hospital_id);

        Self {
            hospital_id,
            window,
            state: WizardState::default(),
            sequencer: SlotQuerySequencer::new(),
            slots: None,
            cancelled: false,
        }
    }

    pub fn hospital_id(&self) -> &HospitalId {
        &self.hospital_id
    }

    pub fn window(&self) -> BookingWindow {
        self.window
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> StepId {
        self.state.step
    }

    pub fn selection(&self) -> &WizardSelection {
        &self.state.selection
    }

    pub fn submission(&self) -> &SubmissionState {
        &self.state.submission
    }

    /// Slot list for the current `(date, veterinarian)`, if it has arrived.
    pub fn slots(&self) -> Option<&SlotResolution> {
        self.current_slots().map(|applied| &applied.resolution)
    }

    /// Like [`BookingWizard::slots`], with the key the list was resolved for.
    pub fn applied_slots(&self) -> Option<&AppliedSlots> {
        self.current_slots()
    }

    pub fn is_closed(&self) -> bool {
        self.cancelled || matches!(self.state.submission, SubmissionState::Succeeded(_))
    }

    fn current_slots(&self) -> Option<&AppliedSlots> {
        let key = self.state.selection.slot_key()?;
        self.slots.as_ref().filter(|applied| applied.key == key)
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        if self.is_closed() {
            return Err(WizardError::Closed);
        }
        if self.state.submission.is_pending() {
            return Err(WizardError::SubmissionInFlight);
        }
        Ok(())
    }

    // ==========================================================================
    // FIELD SETTERS
    // ==========================================================================

    pub fn set_pet(&mut self, pet_id: PetId) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.state.selection.pet_id = Some(pet_id);
        Ok(())
    }

    pub fn set_service(&mut self, service_type: ServiceType) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.state.selection.service_type = Some(service_type);
        Ok(())
    }

    /// Picks a date. A different date clears the chosen time and returns the
    /// slot query to run. Picking the current date again only queries when
    /// its slot list never arrived.
    pub fn set_date(&mut self, date: NaiveDate) -> Result<Option<SlotQuery>, WizardError> {
        self.ensure_editable()?;

        if !self.window.contains(date) {
            return Err(ValidationError::single(
                self.state.step,
                ValidationIssue::DateOutsideWindow(date),
            )
            .into());
        }

        if self.state.selection.date == Some(date) {
            return Ok(self.requery_if_missing());
        }

        self.state.selection.date = Some(date);
        self.clear_time("date changed");
        Ok(Some(self.issue_query(date)))
    }

    /// Sets or drops the veterinarian filter. A different value clears the
    /// chosen time and, once a date is picked, returns the slot query to run.
    pub fn set_veterinarian(
        &mut self,
        veterinarian_id: Option<VeterinarianId>,
    ) -> Result<Option<SlotQuery>, WizardError> {
        self.ensure_editable()?;

        if self.state.selection.veterinarian_id == veterinarian_id {
            return Ok(self.requery_if_missing());
        }

        self.state.selection.veterinarian_id = veterinarian_id;
        self.clear_time("veterinarian changed");

        match self.state.selection.date {
            Some(date) => Ok(Some(self.issue_query(date))),
            None => {
                self.sequencer.invalidate();
                Ok(None)
            }
        }
    }

    /// Picks a time from the slot list currently on screen.
    pub fn set_time(&mut self, time: NaiveTime) -> Result<(), WizardError> {
        self.ensure_editable()?;

        let offered = self
            .slots()
            .map(|resolution| resolution.offers(time))
            .unwrap_or(false);

        if !offered {
            let issue = match self.state.selection.date {
                Some(_) => ValidationIssue::TimeNotOffered(time),
                None => ValidationIssue::DateNotSelected,
            };
            return Err(ValidationError::single(self.state.step, issue).into());
        }

        self.state.selection.time = Some(time);
        Ok(())
    }

    pub fn set_symptoms(&mut self, symptoms: impl Into<String>) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.state.selection.symptoms = symptoms.into();
        Ok(())
    }

    pub fn set_notes(&mut self, notes: Option<String>) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.state.selection.notes = notes.filter(|n| !n.trim().is_empty());
        Ok(())
    }

    fn clear_time(&mut self, reason: &str) {
        if let Some(previous) = self.state.selection.time.take() {
            debug!("Cleared time {} ({})", previous.format("%H:%M"), reason);
        }
    }

    // ==========================================================================
    // SLOT SEQUENCING
    // ==========================================================================

    fn issue_query(&mut self, date: NaiveDate) -> SlotQuery {
        self.sequencer.issue(
            self.hospital_id.clone(),
            date,
            self.state.selection.veterinarian_id.clone(),
        )
    }

    /// Query for the current `(date, veterinarian)` when a date is picked but
    /// no slot list has been applied for it, e.g. after the caller dropped
    /// the previous query.
    fn requery_if_missing(&mut self) -> Option<SlotQuery> {
        if self.current_slots().is_some() {
            return None;
        }
        let date = self.state.selection.date?;
        debug!("No slots applied for {}, requesting them again", date);
        Some(self.issue_query(date))
    }

    /// Re-issues a query for the current `(date, veterinarian)`, e.g. for a
    /// pull-to-refresh. `None` until a date is picked.
    pub fn refresh_query(&mut self) -> Result<Option<SlotQuery>, WizardError> {
        self.ensure_editable()?;
        Ok(self.state.selection.date.map(|date| self.issue_query(date)))
    }

    /// Applies a resolved slot list if `query` is still the latest one issued.
    /// Returns whether it was applied.
    pub fn apply_slot_resolution(&mut self, query: &SlotQuery, resolution: SlotResolution) -> bool {
        if self.is_closed() {
            debug!("Discarding slot query #{}: session closed", query.sequence);
            return false;
        }

        if !self.sequencer.is_current(query.sequence) {
            debug!(
                "Discarding stale slot query #{} (latest #{})",
                query.sequence,
                self.sequencer.latest()
            );
            return false;
        }

        if let Some(cause) = resolution.degraded_cause() {
            warn!(
                "Showing fallback slots for hospital {} on {}: {}",
                self.hospital_id, query.date, cause
            );
        }

        // A refresh for the same key may drop the chosen time.
        if let Some(time) = self.state.selection.time {
            if !resolution.offers(time) {
                info!("Time {} no longer offered, clearing it", time.format("%H:%M"));
                self.state.selection.time = None;
            }
        }

        self.slots = Some(AppliedSlots {
            key: query.key(),
            resolution,
        });
        true
    }

    // ==========================================================================
    // TRANSITIONS
    // ==========================================================================

    pub fn advance(&mut self) -> Result<Advance, WizardError> {
        if self.is_closed() {
            return Err(WizardError::Closed);
        }

        if self.state.submission.is_pending() {
            debug!("Advance ignored: submission already pending");
            return Ok(Advance::SubmissionPending);
        }

        let step = self.state.step;
        if let Err(e) = ValidationGate::can_advance(
            step,
            &self.state.selection,
            &self.window,
            self.current_slots(),
        ) {
            if step == StepId::Confirm {
                error!("Reached confirm with an invalid selection: {}", e);
            } else {
                debug!("Cannot leave {}: {}", step, e);
            }
            return Err(e.into());
        }

        match step.next() {
            Some(next) => {
                self.state.step = next;
                info!("Booking wizard moved {} -> {}", step, next);

                let slot_query = if next == StepId::SelectDateTime && self.current_slots().is_none() {
                    self.state.selection.date.map(|date| self.issue_query(date))
                } else {
                    None
                };

                Ok(Advance::Moved { step: next, slot_query })
            }
            None => {
                let payload = BookingRequestBuilder::build(&self.hospital_id, &self.state.selection)?;
                self.state.submission = SubmissionState::Pending;
                info!("Submitting booking for pet {} at hospital {}", payload.pet_id, self.hospital_id);
                Ok(Advance::Submit(payload))
            }
        }
    }

    /// Moves one step back without clearing anything; at `SelectPet` the
    /// flow is exited instead. Refused with `SubmissionInFlight` while a
    /// submission is pending, so the `Confirm` screen stays up until its
    /// outcome is known.
    pub fn retreat(&mut self) -> Result<Retreat, WizardError> {
        self.ensure_editable()?;

        let step = self.state.step;
        match step.previous() {
            None => {
                debug!("Retreat from {} exits the booking flow", step);
                Ok(Retreat::ExitFlow)
            }
            Some(previous) => {
                if step == StepId::SelectDateTime {
                    // Results for queries issued on this step are no longer wanted.
                    self.sequencer.invalidate();
                }
                self.state.step = previous;
                info!("Booking wizard moved {} -> {}", step, previous);
                Ok(Retreat::Moved(previous))
            }
        }
    }

    /// Closes the wizard (navigated away). Outstanding slot queries become
    /// stale; a pending submission is unaffected and can still be completed.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        self.sequencer.invalidate();
        info!("Booking wizard for hospital {} cancelled at {}", self.hospital_id, self.state.step);
    }

    /// Records the outcome of the submission started by [`Advance::Submit`].
    pub fn complete_submission(
        &mut self,
        result: Result<BookingId, SubmissionError>,
    ) -> Result<(), WizardError> {
        if !self.state.submission.is_pending() {
            return Err(WizardError::NoSubmissionPending);
        }

        match result {
            Ok(booking_id) => {
                info!("Booking {} created", booking_id);
                self.state.submission = SubmissionState::Succeeded(booking_id);
            }
            Err(SubmissionError::AlreadyInFlight) => {
                warn!("Submission rejected locally, another attempt is still running");
            }
            Err(e) => {
                warn!("Booking submission failed: {}", e);
                self.state.submission = SubmissionState::Failed(e.to_string());
            }
        }

        Ok(())
    }
}
