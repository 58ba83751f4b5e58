pub(crate) mod attendance;
pub(crate) mod classes;
pub(crate) mod grades;
pub(crate) mod health;
pub(crate) mod notifications;
pub(crate) mod observations;
pub(crate) mod parent_students;
pub(crate) mod payments;
pub(crate) mod schools;
pub(crate) mod students;
pub(crate) mod subjects;
pub(crate) mod users;
