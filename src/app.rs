use crate::app_state::{HostLink, State};
use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::host::AppObserver;
use crate::ui::TOOLBAR_HEIGHT;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

#[cfg(target_os = "macos")]
use winit::platform::macos::WindowAttributesExtMacOS;

pub enum ShellEvent {
    ImageReady,
    #[cfg(target_arch = "wasm32")]
    StateReady(Box<State>),
}

struct App {
    config: EditorConfig,
    proxy: EventLoopProxy<ShellEvent>,
    state: Option<State>,
}

impl App {
    fn build_editor(&self) -> anyhow::Result<(Editor, HostLink)> {
        let mut editor = Editor::new(&self.config)?;

        #[cfg(not(target_arch = "wasm32"))]
        {
            let proxy = std::sync::Mutex::new(self.proxy.clone());
            editor.set_image_waker(Arc::new(move || {
                if let Ok(proxy) = proxy.lock() {
                    let _ = proxy.send_event(ShellEvent::ImageReady);
                }
            }));
        }

        let autosave_due = Rc::new(Cell::new(false));
        editor.set_observer(Box::new(AppObserver::new(&self.config, autosave_due.clone())));
        Ok((
            editor,
            HostLink {
                autosave_due,
                autosave_path: self.config.autosave_path.clone(),
                padding: self.config.padding,
            },
        ))
    }
}

impl ApplicationHandler<ShellEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let pad = 2 * self.config.padding.round() as u32;
        let mut window_attributes = Window::default_attributes()
            .with_title("bannercanvas")
            .with_inner_size(LogicalSize::new(
                (self.config.width + pad + 40).max(1100),
                self.config.height + pad + TOOLBAR_HEIGHT as u32 + 40,
            ));

        #[cfg(target_os = "macos")]
        {
            window_attributes = window_attributes
                .with_titlebar_transparent(true)
                .with_title_hidden(false);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Couldn't create window: {e}");
                event_loop.exit();
                return;
            }
        };

        #[cfg(target_arch = "wasm32")]
        attach_canvas(&window);

        let (editor, host) = match self.build_editor() {
            Ok(parts) => parts,
            Err(e) => {
                log::error!("Couldn't start editor: {e:#}");
                event_loop.exit();
                return;
            }
        };

        cfg_if::cfg_if! {
            if #[cfg(target_arch = "wasm32")] {
                let proxy = self.proxy.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match State::new(window, editor, host).await {
                        Ok(state) => {
                            let _ = proxy.send_event(ShellEvent::StateReady(Box::new(state)));
                        }
                        Err(e) => log::error!("Couldn't initialise GPU: {e:#}"),
                    }
                });
            } else {
                match pollster::block_on(State::new(window, editor, host)) {
                    Ok(state) => self.state = Some(state),
                    Err(e) => {
                        log::error!("Couldn't initialise GPU: {e:#}");
                        event_loop.exit();
                    }
                }
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ShellEvent) {
        match event {
            ShellEvent::ImageReady => {
                if let Some(state) = &mut self.state {
                    state.needs_compose = true;
                    state.window().request_redraw();
                }
            }
            #[cfg(target_arch = "wasm32")]
            ShellEvent::StateReady(state) => {
                let size = state.window().inner_size();
                let mut state = *state;
                state.resize(size);
                state.window().request_redraw();
                self.state = Some(state);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };
        if window_id != state.window().id() || state.input(&event) {
            return;
        }
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                state.flush_autosave(true);
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                log::info!("WindowEvent::Resized: {}x{}", physical_size.width, physical_size.height);
                state.resize(physical_size);
            }
            WindowEvent::RedrawRequested => {
                state.update();
                match state.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => state.resize(state.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Surface out of memory");
                        event_loop.exit();
                    }
                    Err(e) => log::warn!("Surface error: {e:?}"),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window().request_redraw();
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn attach_canvas(window: &Window) {
    use winit::platform::web::WindowExtWebSys;

    let Some(canvas) = window.canvas() else {
        log::error!("Window has no canvas");
        return;
    };
    let attached = web_sys::window()
        .and_then(|win| win.document())
        .and_then(|doc| {
            let dst = doc
                .get_element_by_id("bannercanvas")
                .or_else(|| doc.body().map(web_sys::Element::from))?;
            dst.append_child(&web_sys::Element::from(canvas)).ok()?;
            Some(())
        });
    if attached.is_none() {
        log::error!("Couldn't append canvas to document body.");
    }
}

pub fn run() -> anyhow::Result<()> {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            let _ = console_log::init_with_level(log::Level::Info);
        } else {
            env_logger::init();
        }
    }

    let config = EditorConfig::from_args_or_env(std::env::args().skip(1))?;
    let event_loop = EventLoop::<ShellEvent>::with_user_event().build()?;
    let mut app = App {
        config,
        proxy: event_loop.create_proxy(),
        state: None,
    };

    event_loop.run_app(&mut app)?;
    if let Some(state) = &mut app.state {
        state.flush_autosave(true);
    }
    Ok(())
}
