//! Human readable reporting of `GL_KHR_debug` messages.
//!
//! The block written for every message is scraped by existing tooling, so
//! the line order and labels are fixed:
//!
//! ```text
//! Message: <text>
//! Source: <source>
//! Type: <type>
//! ID: <id>
//! Severity: <severity>
//!
//! ```

use std::{
    collections::HashSet,
    ffi::{c_void, CStr},
    fmt,
    io::{self, Write},
};

use crate::gl::{self, types::GLenum};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSource {
    Api,
    WindowSystem,
    ShaderCompiler,
    ThirdParty,
    Application,
    Other,
    /// A value this crate has no label for. Rendered as `Unknown`.
    Unknown(GLenum),
}

impl DebugSource {
    pub fn from_gl(value: GLenum) -> Self {
        match value {
            gl::DEBUG_SOURCE_API => Self::Api,
            gl::DEBUG_SOURCE_WINDOW_SYSTEM => Self::WindowSystem,
            gl::DEBUG_SOURCE_SHADER_COMPILER => Self::ShaderCompiler,
            gl::DEBUG_SOURCE_THIRD_PARTY => Self::ThirdParty,
            gl::DEBUG_SOURCE_APPLICATION => Self::Application,
            gl::DEBUG_SOURCE_OTHER => Self::Other,
            other => Self::Unknown(other),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Api => "API",
            Self::WindowSystem => "Window System",
            Self::ShaderCompiler => "Shader Compiler",
            Self::ThirdParty => "Third Party",
            Self::Application => "Application",
            Self::Other => "Other",
            Self::Unknown(_) => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugType {
    Error,
    DeprecatedBehavior,
    UndefinedBehavior,
    Portability,
    Performance,
    Marker,
    PushGroup,
    PopGroup,
    Other,
    Unknown(GLenum),
}

impl DebugType {
    pub fn from_gl(value: GLenum) -> Self {
        match value {
            gl::DEBUG_TYPE_ERROR => Self::Error,
            gl::DEBUG_TYPE_DEPRECATED_BEHAVIOR => Self::DeprecatedBehavior,
            gl::DEBUG_TYPE_UNDEFINED_BEHAVIOR => Self::UndefinedBehavior,
            gl::DEBUG_TYPE_PORTABILITY => Self::Portability,
            gl::DEBUG_TYPE_PERFORMANCE => Self::Performance,
            gl::DEBUG_TYPE_MARKER => Self::Marker,
            gl::DEBUG_TYPE_PUSH_GROUP => Self::PushGroup,
            gl::DEBUG_TYPE_POP_GROUP => Self::PopGroup,
            gl::DEBUG_TYPE_OTHER => Self::Other,
            other => Self::Unknown(other),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::DeprecatedBehavior => "Deprecated Behavior",
            Self::UndefinedBehavior => "Undefined Behavior",
            Self::Portability => "Portability",
            Self::Performance => "Performance",
            Self::Marker => "Marker",
            Self::PushGroup => "Push Group",
            Self::PopGroup => "Pop Group",
            Self::Other => "Other",
            Self::Unknown(_) => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    High,
    Medium,
    Low,
    Notification,
    Unknown(GLenum),
}

impl DebugSeverity {
    pub fn from_gl(value: GLenum) -> Self {
        match value {
            gl::DEBUG_SEVERITY_HIGH => Self::High,
            gl::DEBUG_SEVERITY_MEDIUM => Self::Medium,
            gl::DEBUG_SEVERITY_LOW => Self::Low,
            gl::DEBUG_SEVERITY_NOTIFICATION => Self::Notification,
            other => Self::Unknown(other),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Notification => "Notification",
            Self::Unknown(_) => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugEvent {
    pub source: DebugSource,
    pub kind: DebugType,
    pub id: u32,
    pub severity: DebugSeverity,
    pub message: String,
}

impl fmt::Display for DebugEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Message: {}", self.message)?;
        writeln!(f, "Source: {}", self.source.label())?;
        writeln!(f, "Type: {}", self.kind.label())?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Severity: {}", self.severity.label())?;
        writeln!(f)
    }
}

pub struct DebugReporter {
    suppressed: HashSet<u32>,
}

impl DebugReporter {
    pub fn new(suppressed: HashSet<u32>) -> Self {
        Self { suppressed }
    }

    pub fn is_suppressed(&self, id: u32) -> bool {
        self.suppressed.contains(&id)
    }

    /// Writes the formatted block for `event`, or nothing if its id is
    /// suppressed.
    pub fn report<W: Write>(&self, event: &DebugEvent, out: &mut W) -> io::Result<()> {
        if self.is_suppressed(event.id) {
            return Ok(());
        }
        write!(out, "{event}")?;
        out.flush()
    }
}

impl DebugEvent {
    /// Builds an event from the arguments of a `GLDEBUGPROC` call.
    ///
    /// # Safety
    ///
    /// `message` must be null, point at `length` readable bytes, or point at
    /// a NUL terminated string when `length` is negative.
    pub unsafe fn from_raw(
        source: GLenum,
        gltype: GLenum,
        id: gl::types::GLuint,
        severity: GLenum,
        length: gl::types::GLsizei,
        message: *const gl::types::GLchar,
    ) -> Self {
        Self {
            source: DebugSource::from_gl(source),
            kind: DebugType::from_gl(gltype),
            id,
            severity: DebugSeverity::from_gl(severity),
            message: raw_message(length, message),
        }
    }
}

unsafe fn raw_message(length: gl::types::GLsizei, message: *const gl::types::GLchar) -> String {
    if message.is_null() {
        return String::new();
    }
    let Ok(length) = usize::try_from(length) else {
        return CStr::from_ptr(message).to_string_lossy().into_owned();
    };
    let mut bytes = std::slice::from_raw_parts(message.cast::<u8>(), length);
    // Some drivers count the terminator.
    if let [rest @ .., 0] = bytes {
        bytes = rest;
    }
    String::from_utf8_lossy(bytes).into_owned()
}

/// Reports through the [`DebugReporter`] behind `user_param`. `event` is only
/// built when the id is not suppressed.
///
/// # Safety
///
/// `user_param` must be null or point at a live [`DebugReporter`].
unsafe fn forward_to_reporter<W: Write>(
    user_param: *const c_void,
    id: u32,
    event: impl FnOnce() -> DebugEvent,
    out: &mut W,
) -> io::Result<()> {
    let Some(reporter) = user_param.cast::<DebugReporter>().as_ref() else {
        return Ok(());
    };
    if reporter.is_suppressed(id) {
        return Ok(());
    }
    reporter.report(&event(), out)
}

/// `GLDEBUGPROC` installed by the renderer. `user_param` must point at a
/// [`DebugReporter`] that outlives the registration.
pub(crate) extern "system" fn debug_message_callback(
    source: GLenum,
    gltype: GLenum,
    id: gl::types::GLuint,
    severity: GLenum,
    length: gl::types::GLsizei,
    message: *const gl::types::GLchar,
    user_param: *mut c_void,
) {
    let written = unsafe {
        forward_to_reporter(
            user_param,
            id,
            || DebugEvent::from_raw(source, gltype, id, severity, length, message),
            &mut io::stdout().lock(),
        )
    };
    if let Err(err) = written {
        log::warn!("failed to write GL debug message {id}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter() -> DebugReporter {
        DebugReporter::new(HashSet::from([131185]))
    }

    fn render(reporter: &DebugReporter, event: &DebugEvent) -> String {
        let mut out = Vec::new();
        reporter.report(event, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn event(id: u32) -> DebugEvent {
        DebugEvent {
            source: DebugSource::ShaderCompiler,
            kind: DebugType::Error,
            id,
            severity: DebugSeverity::High,
            message: "bad shader".to_owned(),
        }
    }

    #[test]
    fn formats_shader_compiler_error() {
        assert_eq!(
            render(&reporter(), &event(42)),
            "Message: bad shader\n\
             Source: Shader Compiler\n\
             Type: Error\n\
             ID: 42\n\
             Severity: High\n\
             \n"
        );
    }

    #[test]
    fn suppressed_id_writes_nothing() {
        let mut suppressed = event(131185);
        suppressed.source = DebugSource::Api;
        suppressed.kind = DebugType::Other;
        suppressed.severity = DebugSeverity::Notification;
        assert_eq!(render(&reporter(), &suppressed), "");
        assert_eq!(render(&reporter(), &event(131185)), "");
    }

    #[test]
    fn suppression_set_is_configurable() {
        let reporter = DebugReporter::new(HashSet::from([7, 8]));
        assert_eq!(render(&reporter, &event(7)), "");
        assert_eq!(render(&reporter, &event(8)), "");
        assert!(render(&reporter, &event(131185)).starts_with("Message: bad shader\n"));

        let reporter = DebugReporter::new(HashSet::new());
        assert!(!render(&reporter, &event(131185)).is_empty());
    }

    #[test]
    fn id_is_plain_decimal() {
        for (id, line) in [
            (0, "ID: 0\n"),
            (7, "ID: 7\n"),
            (1000000, "ID: 1000000\n"),
            (u32::MAX, "ID: 4294967295\n"),
        ] {
            assert!(render(&reporter(), &event(id)).contains(line), "{id}");
        }
    }

    #[test]
    fn source_labels() {
        let cases = [
            (gl::DEBUG_SOURCE_API, "API"),
            (gl::DEBUG_SOURCE_WINDOW_SYSTEM, "Window System"),
            (gl::DEBUG_SOURCE_SHADER_COMPILER, "Shader Compiler"),
            (gl::DEBUG_SOURCE_THIRD_PARTY, "Third Party"),
            (gl::DEBUG_SOURCE_APPLICATION, "Application"),
            (gl::DEBUG_SOURCE_OTHER, "Other"),
        ];
        for (value, label) in cases {
            assert_eq!(DebugSource::from_gl(value).label(), label);
        }
    }

    #[test]
    fn type_labels() {
        let cases = [
            (gl::DEBUG_TYPE_ERROR, "Error"),
            (gl::DEBUG_TYPE_DEPRECATED_BEHAVIOR, "Deprecated Behavior"),
            (gl::DEBUG_TYPE_UNDEFINED_BEHAVIOR, "Undefined Behavior"),
            (gl::DEBUG_TYPE_PORTABILITY, "Portability"),
            (gl::DEBUG_TYPE_PERFORMANCE, "Performance"),
            (gl::DEBUG_TYPE_MARKER, "Marker"),
            (gl::DEBUG_TYPE_PUSH_GROUP, "Push Group"),
            (gl::DEBUG_TYPE_POP_GROUP, "Pop Group"),
            (gl::DEBUG_TYPE_OTHER, "Other"),
        ];
        for (value, label) in cases {
            assert_eq!(DebugType::from_gl(value).label(), label);
        }
    }

    #[test]
    fn severity_labels() {
        let cases = [
            (gl::DEBUG_SEVERITY_HIGH, "High"),
            (gl::DEBUG_SEVERITY_MEDIUM, "Medium"),
            (gl::DEBUG_SEVERITY_LOW, "Low"),
            (gl::DEBUG_SEVERITY_NOTIFICATION, "Notification"),
        ];
        for (value, label) in cases {
            assert_eq!(DebugSeverity::from_gl(value).label(), label);
        }
    }

    #[test]
    fn unrecognized_values_render_as_unknown() {
        let event = DebugEvent {
            source: DebugSource::from_gl(0xdead),
            kind: DebugType::from_gl(0xbeef),
            id: 3,
            severity: DebugSeverity::from_gl(0),
            message: "?".to_owned(),
        };
        assert_eq!(event.source, DebugSource::Unknown(0xdead));
        assert_eq!(
            render(&reporter(), &event),
            "Message: ?\nSource: Unknown\nType: Unknown\nID: 3\nSeverity: Unknown\n\n"
        );
    }

    fn raw(text: &[u8], length: i32) -> DebugEvent {
        unsafe {
            DebugEvent::from_raw(
                gl::DEBUG_SOURCE_API,
                gl::DEBUG_TYPE_PERFORMANCE,
                9,
                gl::DEBUG_SEVERITY_MEDIUM,
                length,
                text.as_ptr().cast(),
            )
        }
    }

    #[test]
    fn from_raw_maps_enums() {
        let event = raw(b"slow path\0", -1);
        assert_eq!(
            event,
            DebugEvent {
                source: DebugSource::Api,
                kind: DebugType::Performance,
                id: 9,
                severity: DebugSeverity::Medium,
                message: "slow path".to_owned(),
            }
        );
    }

    #[test]
    fn from_raw_reads_only_length_bytes() {
        // No terminator anywhere in the buffer.
        assert_eq!(raw(b"bad shader and more", 10).message, "bad shader");
        assert_eq!(raw(b"", 0).message, "");
    }

    #[test]
    fn from_raw_drops_counted_terminator() {
        let text = b"bad shader\0";
        assert_eq!(raw(text, text.len() as i32).message, "bad shader");
    }

    #[test]
    fn from_raw_negative_length_stops_at_nul() {
        assert_eq!(raw(b"bad shader\0trailing", -1).message, "bad shader");
    }

    #[test]
    fn from_raw_null_message_is_empty() {
        let event = unsafe { DebugEvent::from_raw(0, 0, 1, 0, 5, std::ptr::null()) };
        assert_eq!(event.message, "");
        assert_eq!(event.severity, DebugSeverity::Unknown(0));
    }

    #[test]
    fn forward_without_reporter_writes_nothing() {
        let mut out = Vec::new();
        unsafe {
            forward_to_reporter(std::ptr::null(), 42, || event(42), &mut out).unwrap();
        }
        assert!(out.is_empty());
    }

    #[test]
    fn forward_skips_suppressed_ids_before_decoding() {
        let reporter = reporter();
        let user_param = &reporter as *const DebugReporter as *const c_void;
        let mut out = Vec::new();
        unsafe {
            forward_to_reporter(
                user_param,
                131185,
                || panic!("suppressed message was decoded"),
                &mut out,
            )
            .unwrap();
        }
        assert!(out.is_empty());
    }

    #[test]
    fn forward_reports_through_user_param() {
        let reporter = reporter();
        let user_param = &reporter as *const DebugReporter as *const c_void;
        let text = b"bad shader";
        let mut out = Vec::new();
        unsafe {
            forward_to_reporter(
                user_param,
                42,
                || {
                    DebugEvent::from_raw(
                        gl::DEBUG_SOURCE_SHADER_COMPILER,
                        gl::DEBUG_TYPE_ERROR,
                        42,
                        gl::DEBUG_SEVERITY_HIGH,
                        text.len() as i32,
                        text.as_ptr().cast(),
                    )
                },
                &mut out,
            )
            .unwrap();
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Message: bad shader\nSource: Shader Compiler\nType: Error\nID: 42\nSeverity: High\n\n"
        );
    }
}
