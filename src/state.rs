//! Shared application state handed to every handler.

use sqlx::PgPool;
use std::sync::Arc;

use crate::application::services::{
    AppointmentService, BeneficiaryHooks, CrudService, HolidayHooks, ScheduleHooks,
};
use crate::domain::entities::{Beneficiary, Holiday, Schedule};
use crate::domain::filter::FilterLimits;
use crate::domain::repositories::HealthRepository;
use crate::infrastructure::persistence::{
    PgAppointmentRepository, PgBeneficiaryRepository, PgHealthRepository, PgHolidayRepository,
    PgScheduleRepository,
};

/// Appointment service wired to the PostgreSQL adapters.
pub type PgAppointmentService = AppointmentService<
    PgAppointmentRepository,
    PgBeneficiaryRepository,
    PgScheduleRepository,
    PgHolidayRepository,
>;

/// Services shared by all requests.
#[derive(Clone)]
pub struct AppState {
    pub beneficiary_service: Arc<CrudService<Beneficiary>>,
    pub holiday_service: Arc<CrudService<Holiday>>,
    pub schedule_service: Arc<CrudService<Schedule>>,
    pub appointment_service: Arc<PgAppointmentService>,
    pub health: Arc<dyn HealthRepository>,
}

impl AppState {
    /// Builds every repository and service on top of one connection pool.
    pub fn new(pool: Arc<PgPool>, booking_horizon_days: i64, limits: FilterLimits) -> Self {
        let beneficiaries = Arc::new(
            PgBeneficiaryRepository::new(pool.clone()).with_limits(limits.clone()),
        );
        let holidays =
            Arc::new(PgHolidayRepository::new(pool.clone()).with_limits(limits.clone()));
        let schedules =
            Arc::new(PgScheduleRepository::new(pool.clone()).with_limits(limits.clone()));
        let appointments =
            Arc::new(PgAppointmentRepository::new(pool.clone()).with_limits(limits.clone()));

        let beneficiary_service = Arc::new(CrudService::new(
            beneficiaries.clone(),
            Arc::new(BeneficiaryHooks::new(
                beneficiaries.clone(),
                appointments.clone(),
            )),
            limits.clone(),
        ));

        let holiday_service = Arc::new(CrudService::new(
            holidays.clone(),
            Arc::new(HolidayHooks::new(holidays.clone())),
            limits.clone(),
        ));

        let schedule_service = Arc::new(CrudService::new(
            schedules.clone(),
            Arc::new(ScheduleHooks::new(schedules.clone(), appointments.clone())),
            limits.clone(),
        ));

        let appointment_service = Arc::new(AppointmentService::new(
            appointments,
            beneficiaries,
            schedules,
            holidays,
            booking_horizon_days,
            limits,
        ));

        Self {
            beneficiary_service,
            holiday_service,
            schedule_service,
            appointment_service,
            health: Arc::new(PgHealthRepository::new(pool)),
        }
    }
}
