use tao::event_loop::EventLoopProxy;

use crate::tray::UserEvent;


/// Turns SIGINT, SIGTERM and SIGHUP into a quit request for the tray.
#[cfg(unix)]
pub fn spawn_signal_thread(proxy: EventLoopProxy<UserEvent>) -> std::io::Result<()> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    std::thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            log::info!("received signal {signal}, quitting");
            if proxy.send_event(UserEvent::Quit).is_err() {
                log::debug!("event loop is gone, dropped quit request");
            }
        }
    });

    Ok(())
}

#[cfg(not(unix))]
pub fn spawn_signal_thread(_proxy: EventLoopProxy<UserEvent>) -> std::io::Result<()> {
    Ok(())
}
