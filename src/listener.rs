use crate::status::AlarmStatus;

/// Observer of security events.
///
/// Listeners are registered on the security service as shared handles and
/// called synchronously, in registration order, from within the operation
/// that produced the event. Callbacks take `&self`; listeners that record
/// anything use interior mutability.
pub trait StatusListener {
    /// The alarm status was set. Called even when the value is unchanged.
    fn notify(&self, status: AlarmStatus);

    /// The camera produced a classification result.
    fn cat_detected(&self, cat_detected: bool);

    /// One or more sensors had their active flag changed by the service.
    fn sensor_status_changed(&self) {}
}
