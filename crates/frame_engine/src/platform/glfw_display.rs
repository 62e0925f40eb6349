//! Window management using GLFW
//!
//! Provides the resizable application window, translates GLFW callbacks into
//! engine [`Event`]s and presents frames through Vulkan.

use ash::vk;

use super::{Display, DisplayError};
use crate::events::{Event, EventQueue};
use crate::input::{Key, MouseButton};
use crate::render::vulkan::VulkanPresenter;
use crate::render::Bitmap;

/// GLFW window presented through Vulkan
///
/// Field order matters: the presenter owns the window surface and must be
/// dropped before the window, and the window before GLFW itself.
pub struct GlfwDisplay {
    presenter: VulkanPresenter,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    glfw: glfw::Glfw,
    title: String,
    size: (u32, u32),
}

impl GlfwDisplay {
    /// Initialize GLFW, open a resizable window and set up presentation
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, DisplayError> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| DisplayError::InitializationFailed(format!("{:?}", e)))?;

        if !glfw.vulkan_supported() {
            return Err(DisplayError::InitializationFailed(
                "GLFW reports no Vulkan support".to_string(),
            ));
        }

        // Frames are copied in through Vulkan, no OpenGL context
        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or_else(|| DisplayError::CreationFailed(format!("{}x{} \"{}\"", width, height, title)))?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_mouse_button_polling(true);
        window.set_scroll_polling(true);

        let required_extensions = glfw.get_required_instance_extensions().ok_or_else(|| {
            DisplayError::InitializationFailed("Failed to get required Vulkan extensions".to_string())
        })?;

        let (fb_width, fb_height) = window.get_framebuffer_size();
        let size = (fb_width.max(0) as u32, fb_height.max(0) as u32);
        let extent = vk::Extent2D {
            width: size.0,
            height: size.1,
        };

        let presenter = VulkanPresenter::new(
            &required_extensions,
            |instance| {
                let mut surface = vk::SurfaceKHR::null();
                let result = window.create_window_surface(instance.handle(), std::ptr::null(), &mut surface);
                if result == vk::Result::SUCCESS {
                    Ok(surface)
                } else {
                    Err(result)
                }
            },
            extent,
        )?;

        log::info!("Created window \"{}\" ({}x{} framebuffer)", title, size.0, size.1);

        Ok(Self {
            presenter,
            window,
            events,
            glfw,
            title: title.to_string(),
            size,
        })
    }
}

impl Display for GlfwDisplay {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn pump_events(&mut self, queue: &mut EventQueue) {
        self.glfw.poll_events();
        for (_, event) in glfw::flush_messages(&self.events) {
            if let Some(event) = translate_event(event) {
                queue.push(event);
            }
        }
    }

    fn acknowledge_resize(&mut self) {
        let (width, height) = self.window.get_framebuffer_size();
        self.size = (width.max(0) as u32, height.max(0) as u32);
        self.presenter.resize(self.size.0, self.size.1);
        log::debug!("Acknowledged resize to {}x{}", self.size.0, self.size.1);
    }

    fn present(&mut self, frame: &Bitmap) -> Result<(), DisplayError> {
        self.presenter.present(frame)?;
        Ok(())
    }
}

impl Drop for GlfwDisplay {
    fn drop(&mut self) {
        log::debug!("Destroying window \"{}\"", self.title);
    }
}

/// Translate a GLFW window event; events the loop does not use map to `None`
fn translate_event(event: glfw::WindowEvent) -> Option<Event> {
    match event {
        glfw::WindowEvent::Close => Some(Event::DisplayClose),
        glfw::WindowEvent::FramebufferSize(width, height) => Some(Event::DisplayResize {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        }),
        // Repeats are not new presses
        glfw::WindowEvent::Key(key, _, glfw::Action::Press, _) => map_key(key).map(Event::KeyDown),
        glfw::WindowEvent::Key(key, _, glfw::Action::Release, _) => map_key(key).map(Event::KeyUp),
        glfw::WindowEvent::CursorPos(x, y) => Some(Event::MouseMoved { x, y }),
        glfw::WindowEvent::MouseButton(button, glfw::Action::Press, _) => {
            map_mouse_button(button).map(Event::MouseButtonDown)
        }
        glfw::WindowEvent::MouseButton(button, glfw::Action::Release, _) => {
            map_mouse_button(button).map(Event::MouseButtonUp)
        }
        glfw::WindowEvent::Scroll(dx, dy) => Some(Event::MouseWheel { dx, dy }),
        _ => None,
    }
}

fn map_mouse_button(button: glfw::MouseButton) -> Option<MouseButton> {
    match button {
        glfw::MouseButton::Button1 => Some(MouseButton::Left),
        glfw::MouseButton::Button2 => Some(MouseButton::Right),
        glfw::MouseButton::Button3 => Some(MouseButton::Middle),
        _ => None,
    }
}

fn map_key(key: glfw::Key) -> Option<Key> {
    use glfw::Key as G;

    let mapped = match key {
        G::A => Key::A,
        G::B => Key::B,
        G::C => Key::C,
        G::D => Key::D,
        G::E => Key::E,
        G::F => Key::F,
        G::G => Key::G,
        G::H => Key::H,
        G::I => Key::I,
        G::J => Key::J,
        G::K => Key::K,
        G::L => Key::L,
        G::M => Key::M,
        G::N => Key::N,
        G::O => Key::O,
        G::P => Key::P,
        G::Q => Key::Q,
        G::R => Key::R,
        G::S => Key::S,
        G::T => Key::T,
        G::U => Key::U,
        G::V => Key::V,
        G::W => Key::W,
        G::X => Key::X,
        G::Y => Key::Y,
        G::Z => Key::Z,
        G::Num0 | G::Kp0 => Key::Num0,
        G::Num1 | G::Kp1 => Key::Num1,
        G::Num2 | G::Kp2 => Key::Num2,
        G::Num3 | G::Kp3 => Key::Num3,
        G::Num4 | G::Kp4 => Key::Num4,
        G::Num5 | G::Kp5 => Key::Num5,
        G::Num6 | G::Kp6 => Key::Num6,
        G::Num7 | G::Kp7 => Key::Num7,
        G::Num8 | G::Kp8 => Key::Num8,
        G::Num9 | G::Kp9 => Key::Num9,
        G::Space => Key::Space,
        G::Enter | G::KpEnter => Key::Enter,
        G::Escape => Key::Escape,
        G::Tab => Key::Tab,
        G::Backspace => Key::Backspace,
        G::Up => Key::Up,
        G::Down => Key::Down,
        G::Left => Key::Left,
        G::Right => Key::Right,
        G::LeftShift | G::RightShift => Key::Shift,
        G::LeftControl | G::RightControl => Key::Control,
        G::LeftAlt | G::RightAlt => Key::Alt,
        _ => return None,
    };
    Some(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(map_key(glfw::Key::Escape), Some(Key::Escape));
        assert_eq!(map_key(glfw::Key::Num1), Some(Key::Num1));
        assert_eq!(map_key(glfw::Key::Kp3), Some(Key::Num3));
        assert_eq!(map_key(glfw::Key::RightShift), Some(Key::Shift));
        assert_eq!(map_key(glfw::Key::F12), None);
    }

    #[test]
    fn test_event_translation() {
        let press = glfw::WindowEvent::Key(glfw::Key::Num2, 0, glfw::Action::Press, glfw::Modifiers::empty());
        assert_eq!(translate_event(press), Some(Event::KeyDown(Key::Num2)));

        let repeat = glfw::WindowEvent::Key(glfw::Key::Num2, 0, glfw::Action::Repeat, glfw::Modifiers::empty());
        assert_eq!(translate_event(repeat), None);

        assert_eq!(translate_event(glfw::WindowEvent::Close), Some(Event::DisplayClose));
        assert_eq!(
            translate_event(glfw::WindowEvent::FramebufferSize(640, 480)),
            Some(Event::DisplayResize { width: 640, height: 480 })
        );
        assert_eq!(
            translate_event(glfw::WindowEvent::MouseButton(
                glfw::MouseButton::Button2,
                glfw::Action::Release,
                glfw::Modifiers::empty()
            )),
            Some(Event::MouseButtonUp(MouseButton::Right))
        );
        assert_eq!(translate_event(glfw::WindowEvent::Focus(true)), None);
    }
}
