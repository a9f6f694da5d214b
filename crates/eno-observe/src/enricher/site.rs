/// Origin of a log call: the module and function that invoked the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub module: &'static str,
    pub function: &'static str,
}

impl CallSite {
    pub const fn new(module: &'static str, function: &'static str) -> Self {
        Self { module, function }
    }
}

/// Reduces the type name of a probe fn nested in the caller to the caller's name.
///
/// `crate::m::<Type as Trait>::putflag::{{closure}}::__probe` becomes `putflag`.
#[doc(hidden)]
pub fn __function_name(probe: &'static str) -> &'static str {
    let name = probe.strip_suffix("::__probe").unwrap_or(probe);
    let name = name.trim_end_matches("::{{closure}}");
    name.rsplit("::").next().unwrap_or(name)
}

/// Captures the [`CallSite`] of the macro invocation.
#[macro_export]
macro_rules! call_site {
    () => {{
        fn __probe() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::CallSite::new(
            ::std::module_path!(),
            $crate::__function_name(__type_name_of(__probe)),
        )
    }};
}

/// Log a DEBUG record through a [`TaskLogger`](crate::TaskLogger).
#[macro_export]
macro_rules! eno_debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debug($crate::call_site!(), ::std::format_args!($($arg)+))
    };
}

/// Log an INFO record through a [`TaskLogger`](crate::TaskLogger).
#[macro_export]
macro_rules! eno_info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.info($crate::call_site!(), ::std::format_args!($($arg)+))
    };
}

/// Log a WARNING record through a [`TaskLogger`](crate::TaskLogger).
#[macro_export]
macro_rules! eno_warning {
    ($logger:expr, $($arg:tt)+) => {
        $logger.warning($crate::call_site!(), ::std::format_args!($($arg)+))
    };
}

/// Log an ERROR record through a [`TaskLogger`](crate::TaskLogger).
#[macro_export]
macro_rules! eno_error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.error($crate::call_site!(), ::std::format_args!($($arg)+))
    };
}

/// Log a CRITICAL record through a [`TaskLogger`](crate::TaskLogger).
#[macro_export]
macro_rules! eno_critical {
    ($logger:expr, $($arg:tt)+) => {
        $logger.critical($crate::call_site!(), ::std::format_args!($($arg)+))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl Probe {
        fn method_site(&self) -> CallSite {
            crate::call_site!()
        }

        async fn async_site(&self) -> CallSite {
            crate::call_site!()
        }
    }

    fn free_site() -> CallSite {
        crate::call_site!()
    }

    #[test]
    fn strips_probe_and_closures() {
        assert_eq!(__function_name("a::b::putflag::__probe"), "putflag");
        assert_eq!(
            __function_name("a::<b::C as d::E>::getflag::{{closure}}::{{closure}}::__probe"),
            "getflag"
        );
        assert_eq!(__function_name("plain"), "plain");
    }

    #[test]
    fn captures_free_function() {
        let site = free_site();
        assert_eq!(site.function, "free_site");
        assert_eq!(site.module, "eno_observe::enricher::site::tests");
    }

    #[test]
    fn captures_method() {
        assert_eq!(Probe.method_site().function, "method_site");
    }

    #[tokio::test]
    async fn captures_async_method() {
        assert_eq!(Probe.async_site().await.function, "async_site");
    }
}
