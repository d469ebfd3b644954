use std::path::Path;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::JoinHandle;

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use log::{debug, error, warn};
use tao::event::{Event, StartCause};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy};
use thiserror::Error;
use tray_icon::menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tray_icon::{BadIcon, Icon, TrayIcon, TrayIconBuilder};

use crate::config::Settings;
use crate::content::{self, APP_NAME};
use crate::timer::{TimerCommand, UiMessage};


pub const ICON_SIZE: u32 = 64;

const BACKGROUND: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
const HEART_PINK: Rgba<u8> = Rgba([0xFF, 0xB6, 0xC1, 0xFF]);

// Two lobes (center, radius) and the point of the heart, in icon pixels
const LOBES: [((f32, f32), f32); 2] = [((20.0, 25.0), 10.0), ((44.0, 25.0), 10.0)];
const POINT: [(f32, f32); 4] = [(32.0, 28.0), (10.0, 48.0), (32.0, 58.0), (54.0, 48.0)];

#[derive(Debug, Error)]
pub enum IconError {
    #[error("could not load icon image: {0}")]
    Load(#[from] image::ImageError),

    #[error("tray rejected icon: {0}")]
    Tray(#[from] BadIcon),
}

#[derive(Debug, Error)]
pub enum TrayError {
    #[error(transparent)]
    Icon(#[from] IconError),

    #[error("could not build tray menu: {0}")]
    Menu(#[from] tray_icon::menu::Error),

    #[error("could not create tray icon: {0}")]
    Tray(#[from] tray_icon::Error),
}

#[derive(Debug)]
pub enum UserEvent {
    Menu(MenuEvent),
    Ui(UiMessage),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ToggleSound,
    TogglePause,
    CheckStatus,
    AlertNow,
    Quit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 5] = [
        MenuAction::ToggleSound,
        MenuAction::TogglePause,
        MenuAction::CheckStatus,
        MenuAction::AlertNow,
        MenuAction::Quit,
    ];

    pub fn id(self) -> &'static str {
        match self {
            MenuAction::ToggleSound => "sound",
            MenuAction::TogglePause => "pause",
            MenuAction::CheckStatus => "status",
            MenuAction::AlertNow => "alert",
            MenuAction::Quit => "quit",
        }
    }

    pub fn from_id(id: &str) -> Option<MenuAction> {
        MenuAction::ALL.into_iter().find(|action| action.id() == id)
    }

    pub fn command(self) -> TimerCommand {
        match self {
            MenuAction::ToggleSound => TimerCommand::ToggleSound,
            MenuAction::TogglePause => TimerCommand::TogglePause,
            MenuAction::CheckStatus => TimerCommand::CheckStatus,
            MenuAction::AlertNow => TimerCommand::AlertNow,
            MenuAction::Quit => TimerCommand::Exit,
        }
    }
}


// Icon

pub fn load_icon_image(path: &Path) -> Result<RgbaImage, IconError> {
    let image = image::open(path)?;
    Ok(image.resize_exact(ICON_SIZE, ICON_SIZE, FilterType::Lanczos3).to_rgba8())
}

/// The configured icon, or the pink heart if it can't be used.
pub fn icon_image(path: &Path) -> RgbaImage {
    load_icon_image(path).unwrap_or_else(|why| {
        warn!("custom icon {} not usable ({why}), using default pink heart", path.display());
        draw_heart()
    })
}

pub fn draw_heart() -> RgbaImage {
    RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let (x, y) = (x as f32, y as f32);

        let in_lobe = LOBES.iter().any(|&((cx, cy), r)| (x - cx).powi(2) + (y - cy).powi(2) <= r * r);

        if in_lobe || in_convex(&POINT, (x, y)) { HEART_PINK } else { BACKGROUND }
    })
}

fn in_convex(polygon: &[(f32, f32)], (px, py): (f32, f32)) -> bool {
    let mut sign = 0.0_f32;

    for (i, &(ax, ay)) in polygon.iter().enumerate() {
        let (bx, by) = polygon[(i + 1) % polygon.len()];
        let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);

        if cross != 0.0 {
            if sign != 0.0 && cross.signum() != sign {
                return false;
            }
            sign = cross.signum();
        }
    }

    true
}

fn to_tray_icon(image: RgbaImage) -> Result<Icon, IconError> {
    let (width, height) = image.dimensions();
    Ok(Icon::from_rgba(image.into_raw(), width, height)?)
}


// Menu

struct TrayMenu {
    menu: Menu,
    sound: MenuItem,
    pause: MenuItem,
}

impl TrayMenu {
    fn build(settings: &Settings) -> Result<TrayMenu, TrayError> {
        let header = MenuItem::new(APP_NAME, false, None);
        let interval = MenuItem::new(content::interval_label(settings.interval_minutes.get()), false, None);
        let sound = item(MenuAction::ToggleSound, content::sound_label(settings.sound_enabled));
        let pause = item(MenuAction::TogglePause, content::pause_label(false));
        let status = item(MenuAction::CheckStatus, "📊 Check Status");
        let alert = item(MenuAction::AlertNow, "🔔 Alert Now");
        let quit = item(MenuAction::Quit, "❌ Quit");

        let menu = Menu::new();
        menu.append_items(&[
            &header,
            &interval,
            &PredefinedMenuItem::separator(),
            &sound,
            &PredefinedMenuItem::separator(),
            &pause,
            &status,
            &alert,
            &PredefinedMenuItem::separator(),
            &quit,
        ])?;

        Ok(TrayMenu { menu, sound, pause })
    }

    fn refresh(&self, paused: bool, sound_enabled: bool) {
        self.sound.set_text(content::sound_label(sound_enabled));
        self.pause.set_text(content::pause_label(paused));
    }
}

fn item(action: MenuAction, text: &str) -> MenuItem {
    MenuItem::with_id(action.id(), text, true, None)
}


// Event loop

pub fn event_loop() -> EventLoop<UserEvent> {
    EventLoopBuilder::<UserEvent>::with_user_event().build()
}

/// Forwards timer messages into the event loop until either side hangs up.
pub fn spawn_ui_bridge(rx_ui: Receiver<UiMessage>, proxy: EventLoopProxy<UserEvent>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for message in rx_ui {
            if proxy.send_event(UserEvent::Ui(message)).is_err() {
                break;
            }
        }
    })
}

/// Runs the tray on the calling thread. Only returns on setup failure.
pub fn run(event_loop: EventLoop<UserEvent>, settings: &Settings, tx_timer: Sender<TimerCommand>) -> Result<(), TrayError> {
    let tray_menu = TrayMenu::build(settings)?;
    let mut icon = Some(to_tray_icon(icon_image(&settings.icon_path))?);
    let mut tray: Option<TrayIcon> = None;

    let proxy = event_loop.create_proxy();
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        if let Err(why) = proxy.send_event(UserEvent::Menu(event)) {
            debug!("event loop is gone, dropped menu event: {why:?}");
        }
    }));

    let send = move |command: TimerCommand| {
        if tx_timer.send(command).is_err() {
            debug!("timer is gone, dropped {command:?}");
        }
    };

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            // The tray must be created once the loop is live
            Event::NewEvents(StartCause::Init) => {
                let mut builder = TrayIconBuilder::new()
                    .with_menu(Box::new(tray_menu.menu.clone()))
                    .with_tooltip(format!("{APP_NAME} 💕"));

                if let Some(icon) = icon.take() {
                    builder = builder.with_icon(icon);
                }

                match builder.build() {
                    Ok(created) => tray = Some(created),
                    Err(why) => {
                        error!("{}", TrayError::from(why));
                        send(TimerCommand::Exit);
                        *control_flow = ControlFlow::Exit;
                    }
                }
            }

            Event::UserEvent(UserEvent::Menu(event)) => match MenuAction::from_id(event.id.0.as_str()) {
                Some(MenuAction::Quit) => {
                    send(TimerCommand::Exit);
                    tray.take();
                    *control_flow = ControlFlow::Exit;
                }
                Some(action) => send(action.command()),
                None => debug!("unhandled menu item {:?}", event.id),
            },

            Event::UserEvent(UserEvent::Ui(UiMessage::Refresh { status, sound_enabled })) => {
                tray_menu.refresh(status.paused, sound_enabled);

                if let Some(tray) = &tray {
                    if let Err(why) = tray.set_tooltip(Some(content::tooltip(&status))) {
                        debug!("could not update tooltip: {why}");
                    }
                }
            }

            Event::UserEvent(UserEvent::Ui(UiMessage::Exit)) | Event::UserEvent(UserEvent::Quit) => {
                send(TimerCommand::Exit);
                tray.take();
                *control_flow = ControlFlow::Exit;
            }

            _ => (),
        }
    })
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn heart_has_pink_lobes_and_point_on_white() {
        let heart = draw_heart();

        assert_eq!(heart.dimensions(), (ICON_SIZE, ICON_SIZE));

        for (x, y) in [(20, 25), (44, 25), (32, 40), (32, 55)] {
            assert_eq!(*heart.get_pixel(x, y), HEART_PINK, "({x}, {y})");
        }
        for (x, y) in [(0, 0), (63, 63), (32, 62), (2, 50), (32, 16)] {
            assert_eq!(*heart.get_pixel(x, y), BACKGROUND, "({x}, {y})");
        }
    }

    #[test]
    fn missing_icon_falls_back_to_the_heart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fox2.jpg");

        assert!(matches!(load_icon_image(&path), Err(IconError::Load(_))));
        assert_eq!(icon_image(&path), draw_heart());
    }

    #[test]
    fn garbage_icon_falls_back_to_the_heart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        assert_eq!(icon_image(&path), draw_heart());
    }

    #[test]
    fn custom_icon_is_resized_to_the_tray_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.png");
        RgbaImage::from_pixel(100, 80, Rgba([10, 20, 30, 255])).save(&path).unwrap();

        let icon = load_icon_image(&path).unwrap();

        assert_eq!(icon.dimensions(), (ICON_SIZE, ICON_SIZE));
        assert_eq!(*icon.get_pixel(32, 32), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn menu_ids_route_to_actions() {
        for action in MenuAction::ALL {
            assert_eq!(MenuAction::from_id(action.id()), Some(action));
        }
        assert_eq!(MenuAction::from_id("header"), None);
        assert_eq!(MenuAction::from_id(""), None);
    }

    #[test]
    fn actions_map_to_timer_commands() {
        assert_eq!(MenuAction::ToggleSound.command(), TimerCommand::ToggleSound);
        assert_eq!(MenuAction::TogglePause.command(), TimerCommand::TogglePause);
        assert_eq!(MenuAction::CheckStatus.command(), TimerCommand::CheckStatus);
        assert_eq!(MenuAction::AlertNow.command(), TimerCommand::AlertNow);
        assert_eq!(MenuAction::Quit.command(), TimerCommand::Exit);
    }
}
