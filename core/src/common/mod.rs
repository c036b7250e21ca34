/// Constants.
pub mod constants;

/// Check <https://www.rustwiki.org.cn/en/reference/introduction.html> for help information.
pub(crate) mod macros;

/// Install the default log formatter.
///
/// Does nothing if the host already installed a subscriber.
pub fn init_log() {
    #[cfg(feature = "log")]
    {
        static INIT: once_cell::sync::OnceCell<()> = once_cell::sync::OnceCell::new();
        _ = INIT.get_or_init(|| {
            let _ = tracing_subscriber::fmt()
                .with_thread_names(true)
                .with_line_number(true)
                .with_timer(tracing_subscriber::fmt::time::OffsetTime::new(
                    time::UtcOffset::from_hms(8, 0, 0).expect("create UtcOffset failed !"),
                    time::format_description::well_known::Rfc2822,
                ))
                .try_init();
        });
    }
}
