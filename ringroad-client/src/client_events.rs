use winit::event::{ElementState, TouchPhase, VirtualKeyCode};

// Everything the window system and gamepads can tell the application
pub trait Watching {
    fn on_key_down(&mut self, key: VirtualKeyCode);
    fn on_key_up(&mut self, key: VirtualKeyCode);

    fn on_left_mouse(&mut self, state: ElementState);
    fn on_touch(&mut self, phase: TouchPhase);
    fn on_gamepad(&mut self, event: gilrs::Event);
}
