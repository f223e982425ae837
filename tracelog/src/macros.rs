//! Instrumentation macros.
//!
//! Each expansion embeds a call-site static pointer to the category
//! record, so after the first hit the disabled path is one relaxed
//! pointer load plus one relaxed byte load, with the arguments never
//! evaluated.

/// Resolves (and caches at the call site) the category record for a
/// literal category group string.
#[doc(hidden)]
#[macro_export]
macro_rules! __trace_category {
    ($category:expr) => {{
        static SITE: ::std::sync::atomic::AtomicPtr<$crate::CategoryGroup> =
            ::std::sync::atomic::AtomicPtr::new(::std::ptr::null_mut());
        let mut cached = SITE.load(::std::sync::atomic::Ordering::Relaxed);
        if cached.is_null() {
            let resolved = $crate::TraceLog::instance().category_group($category);
            cached = resolved as *const $crate::CategoryGroup as *mut $crate::CategoryGroup;
            SITE.store(cached, ::std::sync::atomic::Ordering::Release);
        }
        unsafe { &*(cached as *const $crate::CategoryGroup) }
    }};
}

/// Builds a [`TraceArguments`](crate::TraceArguments) from zero, one,
/// or two `name => value` pairs.
#[macro_export]
macro_rules! trace_args {
    () => {
        $crate::TraceArguments::none()
    };
    ($name:expr => $value:expr $(,)?) => {
        $crate::TraceArguments::one($name, $value)
    };
    ($name1:expr => $value1:expr, $name2:expr => $value2:expr $(,)?) => {
        $crate::TraceArguments::two($name1, $value1, $name2, $value2)
    };
}

/// Records an instant event on the global engine.
#[macro_export]
macro_rules! trace_event_instant {
    ($category:expr, $name:expr $(, $arg_name:expr => $arg_value:expr)* $(,)?) => {{
        let category = $crate::__trace_category!($category);
        if category.is_enabled() {
            $crate::TraceLog::instance().add_trace_event(
                $crate::TracePhase::Instant,
                category,
                $name,
                $crate::TraceId::None,
                0,
                $crate::TRACE_EVENT_FLAG_NONE,
                $crate::trace_args!($($arg_name => $arg_value),*),
            );
        }
    }};
}

/// Records a begin event; pair with [`trace_event_end!`].
#[macro_export]
macro_rules! trace_event_begin {
    ($category:expr, $name:expr $(, $arg_name:expr => $arg_value:expr)* $(,)?) => {{
        let category = $crate::__trace_category!($category);
        if category.is_enabled() {
            $crate::TraceLog::instance().add_trace_event(
                $crate::TracePhase::Begin,
                category,
                $name,
                $crate::TraceId::None,
                0,
                $crate::TRACE_EVENT_FLAG_NONE,
                $crate::trace_args!($($arg_name => $arg_value),*),
            );
        }
    }};
}

#[macro_export]
macro_rules! trace_event_end {
    ($category:expr, $name:expr $(,)?) => {{
        let category = $crate::__trace_category!($category);
        if category.is_enabled() {
            $crate::TraceLog::instance().add_trace_event(
                $crate::TracePhase::End,
                category,
                $name,
                $crate::TraceId::None,
                0,
                $crate::TRACE_EVENT_FLAG_NONE,
                $crate::TraceArguments::none(),
            );
        }
    }};
}

/// Opens a scoped complete event. Bind the result to a local:
///
/// ```ignore
/// let _span = trace_event_scoped!("renderer", "paint");
/// ```
#[macro_export]
macro_rules! trace_event_scoped {
    ($category:expr, $name:expr $(, $arg_name:expr => $arg_value:expr)* $(,)?) => {{
        let category = $crate::__trace_category!($category);
        if category.is_enabled() {
            $crate::TraceLog::instance().scoped_for(
                category,
                $name,
                $crate::trace_args!($($arg_name => $arg_value),*),
            )
        } else {
            $crate::ScopedTracer::inert($crate::TraceLog::instance())
        }
    }};
}

/// Records a counter sample.
#[macro_export]
macro_rules! trace_counter {
    ($category:expr, $name:expr, $value:expr $(,)?) => {{
        let category = $crate::__trace_category!($category);
        if category.is_enabled() {
            $crate::TraceLog::instance().add_trace_event(
                $crate::TracePhase::Counter,
                category,
                $name,
                $crate::TraceId::None,
                0,
                $crate::TRACE_EVENT_FLAG_NONE,
                $crate::TraceArguments::one("value", ($value) as i64),
            );
        }
    }};
}
