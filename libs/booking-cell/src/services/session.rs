// libs/booking-cell/src/services/session.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use availability_cell::{BookingWindow, HttpSlotSource, SlotQuery, SlotResolution, SlotResolver};
use shared_config::AppConfig;
use shared_models::{BookingId, HospitalId, PetId, VeterinarianId};

use crate::error::{SubmissionError, WizardError};
use crate::models::{
    Advance, BookingEvent, BookingPayload, ConfirmationSummary, Retreat, ServiceType, StepId,
    StepOutcome, SubmissionState,
};
use crate::services::gateway::{BookingGateway, DirectorySource, HttpBookingGateway, HttpDirectory};
use crate::services::submission::BookingRequestBuilder;
use crate::services::validation::ValidationGate;
use crate::services::wizard::BookingWizard;

/// One booking screen: the wizard plus the services it drives.
pub struct BookingSession {
    session_id: Uuid,
    wizard: BookingWizard,
    resolver: Arc<SlotResolver>,
    builder: Arc<BookingRequestBuilder>,
    directory: Arc<dyn DirectorySource>,
    events: mpsc::UnboundedSender<BookingEvent>,
    /// Submission task whose outcome has not been recorded on the wizard yet.
    submission: Option<JoinHandle<Result<BookingId, SubmissionError>>>,
}

impl BookingSession {
    pub fn new(
        hospital_id: HospitalId,
        resolver: Arc<SlotResolver>,
        gateway: Arc<dyn BookingGateway>,
        directory: Arc<dyn DirectorySource>,
    ) -> (Self, mpsc::UnboundedReceiver<BookingEvent>) {
        let session_id = Uuid::new_v4();
        let (events, receiver) = mpsc::unbounded_channel();
        let wizard = BookingWizard::new(hospital_id, resolver.window());

        info!("Booking session {} opened for hospital {}", session_id, wizard.hospital_id());

        let session = Self {
            session_id,
            wizard,
            resolver,
            builder: Arc::new(BookingRequestBuilder::new(gateway, session_id)),
            directory,
            events,
            submission: None,
        };

        (session, receiver)
    }

    /// Session wired to the HTTP API with a window starting today.
    pub fn from_config(
        config: &AppConfig,
        hospital_id: HospitalId,
    ) -> (Self, mpsc::UnboundedReceiver<BookingEvent>) {
        let window = BookingWindow::starting_today(config.booking_window_days);
        let resolver = Arc::new(SlotResolver::new(Arc::new(HttpSlotSource::new(config)), window));

        Self::new(
            hospital_id,
            resolver,
            Arc::new(HttpBookingGateway::new(config)),
            Arc::new(HttpDirectory::new(config)),
        )
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn wizard(&self) -> &BookingWizard {
        &self.wizard
    }

    pub fn step(&self) -> StepId {
        self.wizard.step()
    }

    pub fn slots(&self) -> Option<&SlotResolution> {
        self.wizard.slots()
    }

    pub fn submission(&self) -> &SubmissionState {
        self.wizard.submission()
    }

    // ==========================================================================
    // SELECTIONS
    // ==========================================================================

    pub fn select_pet(&mut self, pet_id: PetId) -> Result<(), WizardError> {
        self.poll_submission()?;
        self.wizard.set_pet(pet_id)
    }

    pub fn select_service(&mut self, service_type: ServiceType) -> Result<(), WizardError> {
        self.poll_submission()?;
        self.wizard.set_service(service_type)
    }

    pub fn select_time(&mut self, time: NaiveTime) -> Result<(), WizardError> {
        self.poll_submission()?;
        self.wizard.set_time(time)
    }

    pub fn set_symptoms(&mut self, symptoms: impl Into<String>) -> Result<(), WizardError> {
        self.poll_submission()?;
        self.wizard.set_symptoms(symptoms)
    }

    pub fn set_notes(&mut self, notes: Option<String>) -> Result<(), WizardError> {
        self.poll_submission()?;
        self.wizard.set_notes(notes)
    }

    pub async fn select_date(&mut self, date: NaiveDate) -> Result<(), WizardError> {
        self.poll_submission()?;
        if let Some(query) = self.wizard.set_date(date)? {
            self.run_slot_query(query).await?;
        }
        Ok(())
    }

    pub async fn select_veterinarian(
        &mut self,
        veterinarian_id: Option<VeterinarianId>,
    ) -> Result<(), WizardError> {
        self.poll_submission()?;
        if let Some(query) = self.wizard.set_veterinarian(veterinarian_id)? {
            self.run_slot_query(query).await?;
        }
        Ok(())
    }

    pub async fn refresh_slots(&mut self) -> Result<(), WizardError> {
        self.poll_submission()?;
        if let Some(query) = self.wizard.refresh_query()? {
            self.run_slot_query(query).await?;
        }
        Ok(())
    }

    async fn run_slot_query(&mut self, query: SlotQuery) -> Result<bool, WizardError> {
        let resolution = self.resolver.resolve_query(&query).await?;
        Ok(self.wizard.apply_slot_resolution(&query, resolution))
    }

    // ==========================================================================
    // NAVIGATION
    // ==========================================================================

    pub async fn advance(&mut self) -> Result<StepOutcome, WizardError> {
        self.poll_submission()?;
        match self.wizard.advance()? {
            Advance::Moved { step, slot_query } => {
                if let Some(query) = slot_query {
                    self.run_slot_query(query).await?;
                }
                Ok(StepOutcome::Moved(step))
            }
            Advance::SubmissionPending => Ok(StepOutcome::SubmissionPending),
            Advance::Submit(payload) => self.submit(payload).await,
        }
    }

    /// Runs the submission on its own task so it finishes, and reports its
    /// outcome on the event channel, even if this future is dropped. A
    /// dropped caller leaves the task on the session; its outcome is recorded
    /// by the next call that touches the session.
    async fn submit(&mut self, payload: BookingPayload) -> Result<StepOutcome, WizardError> {
        let builder = Arc::clone(&self.builder);
        let events = self.events.clone();

        self.submission = Some(tokio::spawn(async move {
            let result = builder.submit(&payload).await;
            let event = match &result {
                Ok(booking_id) => Some(BookingEvent::Submitted(booking_id.clone())),
                Err(SubmissionError::AlreadyInFlight) => None,
                Err(e) => Some(BookingEvent::SubmissionFailed(e.to_string())),
            };
            if let Some(event) = event {
                if events.send(event).is_err() {
                    warn!("Booking outcome produced after every listener went away");
                }
            }
            result
        }));

        Ok(self
            .wait_for_submission()
            .await?
            .unwrap_or(StepOutcome::SubmissionPending))
    }

    /// Waits for a running submission and records its outcome. `None` when
    /// nothing is running.
    pub async fn wait_for_submission(&mut self) -> Result<Option<StepOutcome>, WizardError> {
        let Some(handle) = self.submission.as_mut() else {
            return Ok(None);
        };
        let joined = handle.await;
        self.submission = None;
        self.record_submission(joined).map(Some)
    }

    /// Records the outcome of a submission that finished after its caller
    /// stopped waiting. Never blocks.
    pub fn poll_submission(&mut self) -> Result<Option<StepOutcome>, WizardError> {
        let finished = self
            .submission
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(false);
        if !finished {
            return Ok(None);
        }

        let Some(joined) = self.submission.as_mut().and_then(|handle| handle.now_or_never()) else {
            return Ok(None);
        };
        self.submission = None;
        debug!("Recording submission outcome for session {}", self.session_id);
        self.record_submission(joined).map(Some)
    }

    fn record_submission(
        &mut self,
        joined: Result<Result<BookingId, SubmissionError>, JoinError>,
    ) -> Result<StepOutcome, WizardError> {
        let result = match joined {
            Ok(result) => result,
            Err(join_error) => Err(SubmissionError::Interrupted(join_error.to_string())),
        };

        self.wizard.complete_submission(result.clone())?;

        Ok(match result {
            Ok(booking_id) => StepOutcome::Submitted(booking_id),
            Err(SubmissionError::AlreadyInFlight) => StepOutcome::SubmissionPending,
            Err(e) => StepOutcome::SubmissionFailed(e),
        })
    }

    /// Steps back. Refused while a submission is running, see
    /// [`BookingWizard::retreat`].
    pub fn retreat(&mut self) -> Result<Retreat, WizardError> {
        self.poll_submission()?;
        let retreat = self.wizard.retreat()?;
        if retreat == Retreat::ExitFlow {
            self.cancel();
        }
        Ok(retreat)
    }

    /// Leaves the flow. Emits `Cancelled` once; never stops a running
    /// submission.
    pub fn cancel(&mut self) {
        if self.wizard.is_closed() {
            return;
        }
        self.wizard.cancel();
        if self.events.send(BookingEvent::Cancelled).is_err() {
            warn!("Booking session {} cancelled with no listener", self.session_id);
        }
    }

    // ==========================================================================
    // CONFIRMATION
    // ==========================================================================

    /// Display data for the confirm screen. Directory lookups that fail fall
    /// back to bare identifiers.
    pub async fn confirmation_summary(&self) -> Result<ConfirmationSummary, WizardError> {
        let selection = self.wizard.selection();
        let hospital_id = self.wizard.hospital_id().clone();
        let applied = self.wizard.applied_slots();

        ValidationGate::can_advance(StepId::Confirm, selection, &self.wizard.window(), applied)?;

        let payload = BookingRequestBuilder::build(&hospital_id, selection)?;

        let (pet, hospital) = futures::future::join(
            self.directory.pet(&payload.pet_id),
            self.directory.hospital(&hospital_id),
        )
        .await;

        let pet = pet
            .map_err(|e| warn!("Pet lookup for {} failed: {}", payload.pet_id, e))
            .ok();
        let hospital = hospital
            .map_err(|e| warn!("Hospital lookup for {} failed: {}", hospital_id, e))
            .ok();

        let veterinarian_name = applied
            .and_then(|applied| applied.resolution.find(payload.time))
            .and_then(|slot| slot.veterinarian_name.clone());

        Ok(ConfirmationSummary {
            hospital_id,
            hospital,
            pet_id: payload.pet_id,
            pet,
            service_type: payload.service_type,
            date: payload.date,
            time: payload.time,
            veterinarian_name,
            symptoms: selection.symptoms.clone(),
            notes: payload.notes,
            slots_degraded: applied.map(|a| a.resolution.is_degraded()).unwrap_or(false),
        })
    }
}
