//! Pure record-to-fragment rendering.
//!
//! Every function maps a list of domain records to an HTML fragment string
//! and renders a designated placeholder for empty input, never an empty
//! fragment. Course titles, descriptions, and names are user-authored, so all
//! interpolated text is escaped.

use crate::chat::{ChatMessage, ChatRole};
use learnhub_client::{Course, Enrollment, OnlineUser, StudentSummary, UserStats};

pub const NO_COURSES: &str = "No courses found";
pub const NO_AVAILABLE_COURSES: &str = "No courses available";
pub const NO_ENROLLED_COURSES: &str = "No enrolled courses yet";
pub const NO_STUDENTS: &str = "No students found";
pub const NO_ONLINE_USERS: &str = "No online users";

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn no_data(placeholder: &str) -> String {
    format!(r#"<div class="no-data">{placeholder}</div>"#)
}

fn no_data_row(placeholder: &str, columns: usize) -> String {
    format!(r#"<tr><td colspan="{columns}" class="no-data">{placeholder}</td></tr>"#)
}

/// Course cards for the admin and teacher dashboards.
pub fn render_courses(courses: &[Course]) -> String {
    if courses.is_empty() {
        return no_data(NO_COURSES);
    }
    courses
        .iter()
        .map(|course| {
            format!(
                concat!(
                    r#"<div class="course-card" data-course-id="{id}">"#,
                    r#"<div class="course-header">"#,
                    r#"<h3 class="course-title">{title}</h3>"#,
                    r#"<span class="course-price">${price}</span>"#,
                    "</div>",
                    r#"<p class="course-description">{description}</p>"#,
                    r#"<div class="course-meta">"#,
                    "<span>Teacher: {teacher}</span>",
                    "<span>Enrolled: {enrolled}</span>",
                    "</div>",
                    "</div>"
                ),
                id = escape_html(&course.id),
                title = escape_html(&course.title),
                price = course.price,
                description = escape_html(&course.description),
                teacher = escape_html(course.teacher_name.as_deref().unwrap_or("N/A")),
                enrolled = course.enrolled_count.unwrap_or(0),
            )
        })
        .collect()
}

/// Course cards for the student catalog.
pub fn render_catalog(courses: &[Course]) -> String {
    if courses.is_empty() {
        return no_data(NO_AVAILABLE_COURSES);
    }
    courses
        .iter()
        .map(|course| {
            format!(
                concat!(
                    r#"<div class="course-card" data-course-id="{id}">"#,
                    r#"<div class="course-header">"#,
                    r#"<h3 class="course-title">{title}</h3>"#,
                    r#"<span class="course-price">${price}</span>"#,
                    "</div>",
                    r#"<p class="course-description">{description}</p>"#,
                    "</div>"
                ),
                id = escape_html(&course.id),
                title = escape_html(&course.title),
                price = course.price,
                description = escape_html(&course.description),
            )
        })
        .collect()
}

/// Enrollment cards for the student dashboard.
pub fn render_enrollments(enrollments: &[Enrollment]) -> String {
    if enrollments.is_empty() {
        return no_data(NO_ENROLLED_COURSES);
    }
    enrollments
        .iter()
        .map(|enrollment| {
            format!(
                concat!(
                    r#"<div class="course-card">"#,
                    r#"<div class="course-header">"#,
                    r#"<h3 class="course-title">{title}</h3>"#,
                    r#"<span class="course-price">Enrolled</span>"#,
                    "</div>",
                    r#"<div class="course-meta">"#,
                    "<span>Progress: {progress}%</span>",
                    "<span>Enrolled: {enrolled_at}</span>",
                    "</div>",
                    "</div>"
                ),
                title = escape_html(&enrollment.course_title),
                progress = enrollment.progress,
                enrolled_at = escape_html(&enrollment.enrolled_at),
            )
        })
        .collect()
}

/// Table rows for the teacher's student list.
pub fn render_students(students: &[StudentSummary]) -> String {
    if students.is_empty() {
        return no_data_row(NO_STUDENTS, 4);
    }
    students
        .iter()
        .map(|student| {
            let (class, label) = if student.is_active {
                ("status-online", "Online")
            } else {
                ("status-offline", "Offline")
            };
            format!(
                concat!(
                    "<tr>",
                    "<td>{name}</td>",
                    "<td>{email}</td>",
                    "<td>{enrolled}</td>",
                    r#"<td><span class="status-badge {class}">{label}</span></td>"#,
                    "</tr>"
                ),
                name = escape_html(&student.name),
                email = escape_html(&student.email),
                enrolled = student.enrolled_courses,
                class = class,
                label = label,
            )
        })
        .collect()
}

/// Table rows for the admin online-users list.
pub fn render_online_users(users: &[OnlineUser]) -> String {
    if users.is_empty() {
        return no_data_row(NO_ONLINE_USERS, 4);
    }
    users
        .iter()
        .map(|user| {
            format!(
                concat!(
                    "<tr>",
                    "<td>{name}</td>",
                    "<td>{email}</td>",
                    "<td>{role}</td>",
                    r#"<td><span class="status-badge status-online">Online</span></td>"#,
                    "</tr>"
                ),
                name = escape_html(&user.name),
                email = escape_html(&user.email),
                role = user.role,
            )
        })
        .collect()
}

/// Stat cards plus the online-users table for the admin dashboard.
pub fn render_user_stats(stats: &UserStats) -> String {
    format!(
        concat!(
            r#"<div class="stat-card">Total: {total}</div>"#,
            r#"<div class="stat-card">Online: {online}</div>"#,
            r#"<div class="stat-card">Offline: {offline}</div>"#,
            "<tbody>{rows}</tbody>"
        ),
        total = stats.total_users,
        online = stats.online_users,
        offline = stats.offline_users,
        rows = render_online_users(&stats.online_user_details),
    )
}

/// A single chat transcript entry, with the optional intent badge and source
/// citations on assistant messages.
pub fn render_chat_message(message: &ChatMessage) -> String {
    let class = match message.role {
        ChatRole::User => "user-message",
        ChatRole::Bot => "bot-message",
    };
    let mut fragment = format!(
        concat!(
            r#"<div class="message {class}" data-timestamp="{timestamp}">"#,
            r#"<div class="message-text">{text}</div>"#
        ),
        class = class,
        timestamp = escape_html(&message.timestamp),
        text = escape_html(&message.text),
    );
    if !message.sources.is_empty() {
        let titles = message
            .sources
            .iter()
            .map(|source| escape_html(&source.title))
            .collect::<Vec<_>>()
            .join(", ");
        fragment.push_str(&format!(
            r#"<div class="message-sources"><small>Sources: {titles}</small></div>"#
        ));
    }
    if let Some(intent) = &message.intent {
        fragment.push_str(&format!(
            r#"<span class="intent-badge">{}</span>"#,
            escape_html(&intent.replace('_', " "))
        ));
    }
    fragment.push_str("</div>");
    fragment
}
