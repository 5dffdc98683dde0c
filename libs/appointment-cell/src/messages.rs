use std::fmt;

use shared_config::Locale;

use crate::models::Appointment;

/// Fixed user-facing messages. Every business outcome, good or bad, maps to
/// exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCode {
    AppointmentCreated,
    FollowUpCreated,
    AppointmentUpdated,
    AppointmentCancelled,
    AppointmentConfirmed,
    AppointmentAttended,
    NotAllowed,
    NotOwner,
    AppointmentNotFound,
    PatientNotFound,
    DentistNotFound,
    InvalidDate,
    InvalidTime,
    PastDate,
    SlotUnavailable,
    DentistInactive,
    ReasonTooLong,
    InvalidStatus,
    PreviousNotAttended,
    Unexpected,
}

impl MessageCode {
    pub fn code(&self) -> &'static str {
        match self {
            MessageCode::AppointmentCreated => "MSG_APPOINTMENT_CREATED",
            MessageCode::FollowUpCreated => "MSG_FOLLOW_UP_CREATED",
            MessageCode::AppointmentUpdated => "MSG_APPOINTMENT_UPDATED",
            MessageCode::AppointmentCancelled => "MSG_APPOINTMENT_CANCELLED",
            MessageCode::AppointmentConfirmed => "MSG_APPOINTMENT_CONFIRMED",
            MessageCode::AppointmentAttended => "MSG_APPOINTMENT_ATTENDED",
            MessageCode::NotAllowed => "MSG_UNAUTHORIZED",
            MessageCode::NotOwner => "MSG_NOT_OWNER",
            MessageCode::AppointmentNotFound => "MSG_APPOINTMENT_NOT_FOUND",
            MessageCode::PatientNotFound => "MSG_PATIENT_NOT_FOUND",
            MessageCode::DentistNotFound => "MSG_DENTIST_NOT_FOUND",
            MessageCode::InvalidDate => "MSG_INVALID_DATE",
            MessageCode::InvalidTime => "MSG_INVALID_TIME",
            MessageCode::PastDate => "MSG_PAST_DATE",
            MessageCode::SlotUnavailable => "MSG_SLOT_UNAVAILABLE",
            MessageCode::DentistInactive => "MSG_DENTIST_INACTIVE",
            MessageCode::ReasonTooLong => "MSG_REASON_TOO_LONG",
            MessageCode::InvalidStatus => "MSG_INVALID_STATUS",
            MessageCode::PreviousNotAttended => "MSG_PREVIOUS_NOT_ATTENDED",
            MessageCode::Unexpected => "MSG_UNEXPECTED",
        }
    }

    pub fn text(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.english(),
            Locale::Vi => self.vietnamese(),
        }
    }

    fn english(&self) -> &'static str {
        match self {
            MessageCode::AppointmentCreated => "Appointment booked successfully",
            MessageCode::FollowUpCreated => "Follow-up appointment created successfully",
            MessageCode::AppointmentUpdated => "Appointment updated successfully",
            MessageCode::AppointmentCancelled => "Appointment cancelled successfully",
            MessageCode::AppointmentConfirmed => "Appointment confirmed successfully",
            MessageCode::AppointmentAttended => "Appointment marked as attended",
            MessageCode::NotAllowed => "You are not allowed to perform this action",
            MessageCode::NotOwner => "This appointment does not belong to you",
            MessageCode::AppointmentNotFound => "Appointment not found",
            MessageCode::PatientNotFound => "Patient not found",
            MessageCode::DentistNotFound => "Dentist not found",
            MessageCode::InvalidDate => "Date must use the YYYY-MM-DD format",
            MessageCode::InvalidTime => "Time must use the HH:MM format",
            MessageCode::PastDate => "The appointment date cannot be in the past",
            MessageCode::SlotUnavailable => "The dentist already has an appointment at this time",
            MessageCode::DentistInactive => "The dentist is not accepting appointments",
            MessageCode::ReasonTooLong => "The reason is too long",
            MessageCode::InvalidStatus => "The appointment cannot be changed in its current status",
            MessageCode::PreviousNotAttended => "A follow-up requires an attended previous visit",
            MessageCode::Unexpected => "An unexpected error occurred, please try again later",
        }
    }

    fn vietnamese(&self) -> &'static str {
        match self {
            MessageCode::AppointmentCreated => "Đặt lịch hẹn thành công",
            MessageCode::FollowUpCreated => "Tạo lịch tái khám thành công",
            MessageCode::AppointmentUpdated => "Cập nhật lịch hẹn thành công",
            MessageCode::AppointmentCancelled => "Hủy lịch hẹn thành công",
            MessageCode::AppointmentConfirmed => "Xác nhận lịch hẹn thành công",
            MessageCode::AppointmentAttended => "Đã ghi nhận bệnh nhân đến khám",
            MessageCode::NotAllowed => "Bạn không có quyền thực hiện thao tác này",
            MessageCode::NotOwner => "Lịch hẹn này không thuộc về bạn",
            MessageCode::AppointmentNotFound => "Không tìm thấy lịch hẹn",
            MessageCode::PatientNotFound => "Không tìm thấy bệnh nhân",
            MessageCode::DentistNotFound => "Không tìm thấy nha sĩ",
            MessageCode::InvalidDate => "Ngày phải có định dạng YYYY-MM-DD",
            MessageCode::InvalidTime => "Giờ phải có định dạng HH:MM",
            MessageCode::PastDate => "Ngày hẹn không được ở trong quá khứ",
            MessageCode::SlotUnavailable => "Nha sĩ đã có lịch hẹn vào thời gian này",
            MessageCode::DentistInactive => "Nha sĩ hiện không nhận lịch hẹn",
            MessageCode::ReasonTooLong => "Nội dung lý do quá dài",
            MessageCode::InvalidStatus => "Không thể thay đổi lịch hẹn ở trạng thái hiện tại",
            MessageCode::PreviousNotAttended => "Chỉ tạo lịch tái khám cho lần khám đã hoàn thành",
            MessageCode::Unexpected => "Đã xảy ra lỗi, vui lòng thử lại sau",
        }
    }
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One-line description of an appointment for notification bodies.
pub fn appointment_summary(appointment: &Appointment, locale: Locale) -> String {
    let time = appointment.time.format("%H:%M");
    match locale {
        Locale::En => format!(
            "Appointment #{} on {} at {}",
            appointment.id, appointment.date, time
        ),
        Locale::Vi => format!(
            "Lịch hẹn #{} vào ngày {} lúc {}",
            appointment.id, appointment.date, time
        ),
    }
}
