mod calendar_event;
mod solution_event;
mod timetable_run;

pub use calendar_event::{CalendarEvent, CalendarEventSummary, NewCalendarEvent};
pub use solution_event::{SolutionEvent, TUITION_CATEGORY};
pub use timetable_run::{NewTimetableRun, RunStatus, RunSummary, TimetableRun};
