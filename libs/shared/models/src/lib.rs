pub mod scheduling;

pub use scheduling::{
    Appointment, AppointmentStatus, Customer, NewAppointment, NewCustomer, SampleType, TimeSlot,
};
