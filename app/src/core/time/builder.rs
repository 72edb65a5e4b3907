#[macro_export]
macro_rules! t {
    (now) => {{
        $crate::core::time::DateTime::now()
    }};

    ($from_hour:literal : $from_minute:literal - $to_hour:literal : $to_minute:literal) => {{
        $crate::core::time::DailyTimeRange::new($crate::t!($from_hour:$from_minute), $crate::t!($to_hour:$to_minute))
    }};

    ($hour:literal : $minute:literal) => {{
        $crate::core::time::Time::at($hour, $minute).unwrap()
    }};
}
