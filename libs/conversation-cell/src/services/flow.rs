// libs/conversation-cell/src/services/flow.rs
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use appointment_cell::models::{AppointmentError, CreateAppointmentRequest};
use appointment_cell::services::availability::AvailabilityService;
use appointment_cell::services::booking::AppointmentBookingService;
use customer_cell::models::CustomerError;
use customer_cell::services::directory::CustomerDirectoryService;
use shared_models::{SampleType, TimeSlot};
use shared_utils::Clock;

use crate::models::{BookingSession, BookingStep, ConversationError, TurnReply};
use crate::services::dates::parse_date_expr;
use crate::services::session::SessionStore;

const AFFIRMATIVE: [&str; 6] = ["sí", "si", "confirmar", "confirmo", "acepto", "ok"];
const NEGATIVE: [&str; 3] = ["no", "cambiar", "modificar"];
const CANCEL: [&str; 2] = ["cancelar", "salir"];

/// Drives one customer's booking conversation through its states. Every turn
/// takes the raw chat text, mutates the session, and returns the next prompt;
/// user mistakes re-prompt in place and only infrastructure failures surface
/// as errors.
pub struct BookingFlowService {
    sessions: SessionStore,
    directory: Arc<CustomerDirectoryService>,
    booking: Arc<AppointmentBookingService>,
    availability: Arc<AvailabilityService>,
    clock: Arc<dyn Clock>,
}

impl BookingFlowService {
    pub fn new(
        directory: Arc<CustomerDirectoryService>,
        booking: Arc<AppointmentBookingService>,
        availability: Arc<AvailabilityService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions: SessionStore::new(),
            directory,
            booking,
            availability,
            clock,
        }
    }

    /// Open a booking conversation. Customers with a live appointment are
    /// turned away; customers without an address are asked for one first.
    pub async fn start_booking(&self, customer_id: Uuid) -> Result<TurnReply, ConversationError> {
        if let Some(active) = self.booking.active_appointment(customer_id).await? {
            return Ok(TurnReply::at(
                BookingStep::Aborted,
                format!(
                    "Ya tienes una cita activa (referencia {}) para el {}. \
                     Cancélala primero si deseas agendar una nueva.",
                    active.short_id(),
                    active.appointment_date.format("%d/%m/%Y")
                ),
            ));
        }

        let customer = self.directory.find_by_id(customer_id).await?;
        let mut session =
            BookingSession::new(customer_id, BookingStep::Start, self.clock.now());

        let reply = if !customer.has_address() {
            session.step = BookingStep::CollectAddress;
            TurnReply::at(
                BookingStep::CollectAddress,
                "¡Con gusto te agendamos! 🏠 Para la visita a domicilio necesitamos \
                 tu dirección completa en Buga (barrio, carrera o calle y número).",
            )
        } else {
            session.step = BookingStep::SelectDate;
            TurnReply::at(BookingStep::SelectDate, self.date_prompt().await?)
        };

        self.sessions.put(session).await;
        info!(customer_id = %customer_id, "booking conversation started");
        Ok(reply)
    }

    /// Process one customer turn against the active session.
    pub async fn submit_input(
        &self,
        customer_id: Uuid,
        raw_text: &str,
    ) -> Result<TurnReply, ConversationError> {
        let mut session = self
            .sessions
            .get(customer_id)
            .await
            .ok_or(ConversationError::NoSession)?;
        let text = raw_text.trim().to_lowercase();

        // An explicit "cancelar" abandons the conversation from any state.
        if CANCEL.contains(&text.as_str()) {
            self.sessions.remove(customer_id).await;
            return Ok(TurnReply::at(
                BookingStep::Aborted,
                "Entendido, no agendamos nada. Escríbenos cuando quieras. 👋",
            ));
        }

        let reply = match session.step {
            BookingStep::CollectAddress => {
                self.on_address(&mut session, raw_text.trim()).await?
            }
            BookingStep::SelectDate => self.on_date(&mut session, &text).await?,
            BookingStep::SelectTime => self.on_time(&mut session, &text).await?,
            BookingStep::SelectSampleType => self.on_sample_type(&mut session, &text).await?,
            BookingStep::Confirm => self.on_confirm(&mut session, &text).await?,
            BookingStep::Modify => self.on_modify(&mut session, &text).await?,
            // Sessions are only stored past Start and removed at terminals.
            BookingStep::Start | BookingStep::Booked | BookingStep::Aborted => {
                return Err(ConversationError::NoSession)
            }
        };

        if reply.terminal {
            self.sessions.remove(customer_id).await;
        } else {
            self.sessions.put(session).await;
        }
        Ok(reply)
    }

    async fn on_address(
        &self,
        session: &mut BookingSession,
        address: &str,
    ) -> Result<TurnReply, ConversationError> {
        // Cheap length gate before the directory heuristics run.
        if address.chars().count() < 10 {
            return Ok(TurnReply::at(
                BookingStep::CollectAddress,
                "La dirección parece muy corta. Incluye barrio, carrera o calle y número.",
            ));
        }

        match self.directory.update_address(session.customer_id, address).await {
            Ok(_) => {
                session.step = BookingStep::SelectDate;
                Ok(TurnReply::at(
                    BookingStep::SelectDate,
                    format!("✅ Dirección registrada.\n\n{}", self.date_prompt().await?),
                ))
            }
            Err(
                e @ (CustomerError::Validation(_)
                | CustomerError::OutOfServiceArea
                | CustomerError::AddressTooVague),
            ) => Ok(TurnReply::at(BookingStep::CollectAddress, e.to_string())),
            Err(other) => Err(other.into()),
        }
    }

    async fn on_date(
        &self,
        session: &mut BookingSession,
        text: &str,
    ) -> Result<TurnReply, ConversationError> {
        let Some(date) = parse_date_expr(text, self.clock.today()) else {
            return Ok(TurnReply::at(
                BookingStep::SelectDate,
                "No entendí la fecha. 🗓️ Puedes escribir \"hoy\", \"mañana\", \
                 un día de la semana o por ejemplo \"15 de enero\".",
            ));
        };

        let grid = match self.availability.compute_availability(date, date).await {
            Ok(grid) => grid,
            Err(AppointmentError::Validation(message)) => {
                return Ok(TurnReply::at(BookingStep::SelectDate, message));
            }
            Err(other) => return Err(other.into()),
        };

        let free: Vec<TimeSlot> = grid
            .into_iter()
            .filter(|cell| cell.available)
            .map(|cell| cell.time_slot)
            .collect();

        if free.is_empty() {
            let suggestion = match self.availability.next_available_slot().await? {
                Some(next) => format!(
                    "El próximo horario libre es el {} a las {}.",
                    next.date.format("%d/%m/%Y"),
                    next.time_slot.start_time.format("%H:%M")
                ),
                None => "Por ahora no hay horarios libres en los próximos días.".to_string(),
            };
            return Ok(TurnReply::at(
                BookingStep::SelectDate,
                format!(
                    "😔 Para el {} no hay disponibilidad. {} ¿Qué otra fecha te sirve?",
                    date.format("%d/%m/%Y"),
                    suggestion
                ),
            ));
        }

        session.selected_date = Some(date);
        session.candidate_slots = free;
        session.step = BookingStep::SelectTime;
        Ok(TurnReply::at(
            BookingStep::SelectTime,
            format!(
                "Horarios para el {}:\n{}\nResponde con el número del horario.",
                date.format("%d/%m/%Y"),
                slot_menu(&session.candidate_slots)
            ),
        ))
    }

    async fn on_time(
        &self,
        session: &mut BookingSession,
        text: &str,
    ) -> Result<TurnReply, ConversationError> {
        let choice = text.parse::<usize>().ok().and_then(|n| {
            n.checked_sub(1)
                .and_then(|idx| session.candidate_slots.get(idx).cloned())
        });

        let Some(slot) = choice else {
            return Ok(TurnReply::at(
                BookingStep::SelectTime,
                format!(
                    "Por favor responde con un número entre 1 y {}.",
                    session.candidate_slots.len()
                ),
            ));
        };

        session.selected_slot = Some(slot);
        session.step = BookingStep::SelectSampleType;
        Ok(TurnReply::at(
            BookingStep::SelectSampleType,
            format!(
                "¿Qué tipo de muestra se tomará?\n{}\nResponde con el número.",
                sample_menu()
            ),
        ))
    }

    async fn on_sample_type(
        &self,
        session: &mut BookingSession,
        text: &str,
    ) -> Result<TurnReply, ConversationError> {
        let choice = text
            .parse::<usize>()
            .ok()
            .and_then(SampleType::from_menu_choice);

        let Some(sample_type) = choice else {
            return Ok(TurnReply::at(
                BookingStep::SelectSampleType,
                format!(
                    "Por favor responde con un número entre 1 y {}.",
                    SampleType::ALL.len()
                ),
            ));
        };

        session.sample_type = Some(sample_type);
        session.step = BookingStep::Confirm;
        Ok(TurnReply::at(
            BookingStep::Confirm,
            self.confirmation_prompt(session),
        ))
    }

    async fn on_confirm(
        &self,
        session: &mut BookingSession,
        text: &str,
    ) -> Result<TurnReply, ConversationError> {
        if NEGATIVE.contains(&text) {
            session.step = BookingStep::Modify;
            return Ok(TurnReply::at(
                BookingStep::Modify,
                "¿Qué deseas cambiar?\n1. Fecha\n2. Horario\n3. Tipo de muestra\n4. Dirección",
            ));
        }
        if !AFFIRMATIVE.contains(&text) {
            return Ok(TurnReply::at(
                BookingStep::Confirm,
                "Responde *sí* para confirmar, *cambiar* para modificar algo \
                 o *cancelar* para salir.",
            ));
        }

        // The session carries the full selection once we reach Confirm.
        let (Some(date), Some(slot), Some(sample_type)) = (
            session.selected_date,
            session.selected_slot.clone(),
            session.sample_type,
        ) else {
            session.step = BookingStep::SelectDate;
            return Ok(TurnReply::at(
                BookingStep::SelectDate,
                "Nos falta información de tu cita. Empecemos de nuevo: ¿para qué fecha?",
            ));
        };

        let created = self
            .booking
            .create(CreateAppointmentRequest {
                customer_id: session.customer_id,
                appointment_date: date,
                time_slot_id: slot.id,
                sample_type,
                special_instructions: None,
            })
            .await;

        match created {
            Ok(appointment) => Ok(TurnReply::at(
                BookingStep::Booked,
                format!(
                    "🎉 ¡Cita agendada! Referencia *{}*.\n📅 {} a las {}\n💰 Total: ${}\n\
                     Te esperamos en tu domicilio. Recuerda tener la orden médica a la mano.",
                    appointment.short_id(),
                    appointment.appointment_date.format("%d/%m/%Y"),
                    slot.start_time.format("%H:%M"),
                    format_cop(appointment.total_amount_cop)
                ),
            )),
            // The last place was taken while the customer decided.
            Err(AppointmentError::SlotFull { .. }) => {
                session.step = BookingStep::SelectDate;
                session.selected_date = None;
                session.candidate_slots.clear();
                session.selected_slot = None;
                Ok(TurnReply::at(
                    BookingStep::SelectDate,
                    format!(
                        "😔 Ese horario se acaba de llenar.\n\n{}",
                        self.date_prompt().await?
                    ),
                ))
            }
            Err(AppointmentError::Validation(message)) => {
                session.step = BookingStep::SelectDate;
                Ok(TurnReply::at(BookingStep::SelectDate, message))
            }
            // Transient failure: keep the session so the customer can retry.
            Err(other) => {
                warn!(
                    customer_id = %session.customer_id,
                    "booking confirmation failed: {other}"
                );
                Ok(TurnReply::at(
                    BookingStep::Confirm,
                    "⚠️ Tuvimos un problema guardando tu cita. Por favor responde \
                     *sí* nuevamente para reintentar.",
                ))
            }
        }
    }

    async fn on_modify(
        &self,
        session: &mut BookingSession,
        text: &str,
    ) -> Result<TurnReply, ConversationError> {
        match text {
            "1" | "fecha" => {
                session.step = BookingStep::SelectDate;
                session.selected_date = None;
                session.candidate_slots.clear();
                session.selected_slot = None;
                Ok(TurnReply::at(BookingStep::SelectDate, self.date_prompt().await?))
            }
            "2" | "horario" => {
                if session.candidate_slots.is_empty() {
                    session.step = BookingStep::SelectDate;
                    return Ok(TurnReply::at(BookingStep::SelectDate, self.date_prompt().await?));
                }
                session.step = BookingStep::SelectTime;
                Ok(TurnReply::at(
                    BookingStep::SelectTime,
                    format!(
                        "Horarios disponibles:\n{}\nResponde con el número del horario.",
                        slot_menu(&session.candidate_slots)
                    ),
                ))
            }
            "3" | "tipo de muestra" | "muestra" => {
                session.step = BookingStep::SelectSampleType;
                Ok(TurnReply::at(
                    BookingStep::SelectSampleType,
                    format!("¿Qué tipo de muestra se tomará?\n{}", sample_menu()),
                ))
            }
            "4" | "dirección" | "direccion" => {
                session.step = BookingStep::CollectAddress;
                Ok(TurnReply::at(
                    BookingStep::CollectAddress,
                    "Escríbenos la nueva dirección completa en Buga.",
                ))
            }
            _ => Ok(TurnReply::at(
                BookingStep::Modify,
                "Responde 1 (fecha), 2 (horario), 3 (tipo de muestra) o 4 (dirección).",
            )),
        }
    }

    async fn date_prompt(&self) -> Result<String, ConversationError> {
        let summary = self
            .availability
            .availability_summary(self.clock.today(), 7)
            .await?;
        Ok(format!(
            "{summary}\n\n¿Para qué fecha deseas la visita? Puedes escribir \
             \"hoy\", \"mañana\", un día de la semana o \"15 de enero\"."
        ))
    }

    fn confirmation_prompt(&self, session: &BookingSession) -> String {
        let date = session
            .selected_date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default();
        let time = session
            .selected_slot
            .as_ref()
            .map(|s| s.start_time.format("%H:%M").to_string())
            .unwrap_or_default();
        let sample = session
            .sample_type
            .map(|s| s.label().to_string())
            .unwrap_or_default();
        format!(
            "Por favor confirma tu cita:\n📅 Fecha: {date}\n🕐 Hora: {time}\n\
             🧪 Muestra: {sample}\n\nResponde *sí* para confirmar, *cambiar* \
             para modificar o *cancelar* para salir."
        )
    }
}

fn slot_menu(slots: &[TimeSlot]) -> String {
    slots
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            format!(
                "{}. {} - {}",
                i + 1,
                slot.start_time.format("%H:%M"),
                slot.end_time.format("%H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn sample_menu() -> String {
    SampleType::ALL
        .iter()
        .enumerate()
        .map(|(i, sample)| format!("{}. {}", i + 1, sample.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// COP amounts with dot thousand separators, as written locally.
fn format_cop(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
