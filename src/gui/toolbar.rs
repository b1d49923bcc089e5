//! Toolbar Widgets
//! Shared event-handler wiring plus the select button and plain button the
//! top toolbar is assembled from.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use egui::{
    pos2, vec2, Align2, Color32, FontId, Frame, Key, Modifiers, Order, Response, Sense, Stroke,
    Ui, WidgetInfo, WidgetType,
};

pub const TOOLBAR_HEIGHT: f32 = 36.0;
pub const ICON_SIZE: f32 = 18.0;
const MENU_MIN_WIDTH: f32 = 140.0;
const ACCENT: Color32 = Color32::from_rgb(59, 114, 243);

struct HandlerSlot {
    action: Box<dyn FnMut()>,
    disabled: bool,
    trigger_keys: Vec<Key>,
    was_hovered: bool,
}

/// Event wiring for one toolbar control.
///
/// The bundle's identity is fixed at construction; the slot behind it is
/// refreshed every frame with the latest action and enablement flag, so a
/// caller keeps one `ToolbarHandlers` per control and never rebuilds it.
pub struct ToolbarHandlers {
    slot: Rc<RefCell<HandlerSlot>>,
}

impl Default for ToolbarHandlers {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolbarHandlers {
    pub fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(HandlerSlot {
                action: Box::new(|| {}),
                disabled: false,
                trigger_keys: vec![Key::Enter],
                was_hovered: false,
            })),
        }
    }

    pub fn with_trigger_keys(self, keys: Vec<Key>) -> Self {
        self.slot.borrow_mut().trigger_keys = keys;
        self
    }

    /// Install the current action and enablement flag for this frame.
    pub fn sync(&self, action: impl FnMut() + 'static, disabled: bool) {
        let mut slot = self.slot.borrow_mut();
        slot.action = Box::new(action);
        slot.disabled = disabled;
    }

    /// Pointer activation. The disabled guard lives here, so no caller can
    /// invoke the action around it.
    pub fn activate(&self) {
        let mut slot = self.slot.borrow_mut();
        if slot.disabled {
            return;
        }
        (slot.action)();
    }

    /// Keyboard activation. Returns whether the key matched the trigger set
    /// and the event should be swallowed. A matching key on a disabled
    /// control is still swallowed; the action is not invoked.
    pub fn key_press(&self, key: Key) -> bool {
        let matched = self.slot.borrow().trigger_keys.contains(&key);
        if matched {
            self.activate();
        }
        matched
    }

    /// Clears keyboard focus from whichever widget currently holds it.
    pub fn defocus(&self, ctx: &egui::Context) {
        if let Some(id) = ctx.memory(|m| m.focused()) {
            ctx.memory_mut(|m| m.surrender_focus(id));
        }
    }

    /// Per-frame glue between the bundle and a drawn widget: click
    /// activates, a trigger key while focused is consumed and activates,
    /// and a pointer-exit transition drops keyboard focus.
    pub fn wire(&self, response: &Response) {
        if response.clicked() {
            self.activate();
        }
        if response.has_focus() {
            let keys = self.slot.borrow().trigger_keys.clone();
            for key in keys {
                if response
                    .ctx
                    .input_mut(|i| i.consume_key(Modifiers::NONE, key))
                {
                    self.key_press(key);
                }
            }
        }
        let hovered = response.hovered();
        let was_hovered = {
            let mut slot = self.slot.borrow_mut();
            std::mem::replace(&mut slot.was_hovered, hovered)
        };
        if was_hovered && !hovered {
            self.defocus(&response.ctx);
        }
    }
}

/// One entry of a select button's menu.
#[derive(Debug, Clone)]
pub struct ToolbarOption {
    pub key: String,
    pub icon: &'static str,
    pub label: String,
    pub disabled: bool,
}

impl ToolbarOption {
    pub fn new(key: impl Into<String>, icon: &'static str, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            icon,
            label: label.into(),
            disabled: false,
        }
    }
}

/// Configuration of a select button, rebuilt by the caller every frame.
#[derive(Debug, Clone)]
pub struct SelectButtonItem {
    pub label: String,
    pub icon: &'static str,
    pub disabled: bool,
    pub options: Vec<ToolbarOption>,
    pub value: String,
}

impl SelectButtonItem {
    /// The option matching the current value, if any. A stale value is a
    /// normal state, not an error.
    pub fn current_option(&self) -> Option<&ToolbarOption> {
        self.options.iter().find(|o| o.key == self.value)
    }

    /// Tooltip label, suffixed with the selected option when one matches.
    pub fn display_label(&self) -> String {
        match self.current_option() {
            Some(option) => format!("{}: {}", self.label, option.label),
            None => self.label.clone(),
        }
    }
}

fn unique_keys(options: &[ToolbarOption]) -> bool {
    let mut seen = std::collections::HashSet::new();
    options.iter().all(|o| seen.insert(o.key.as_str()))
}

/// Cyclic step from the option at `index`.
fn step_option(options: &[ToolbarOption], index: usize, delta: isize) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let len = options.len() as isize;
    let next = (index as isize + delta).rem_euclid(len);
    Some(options[next as usize].key.clone())
}

enum OptionEvent {
    /// Focus landed on the option (tab or programmatic). Selects, menu stays
    /// open.
    Focused(String),
    /// Explicit click. Selects and closes.
    Clicked(String),
    /// Arrow-key step from a focused option. Selects, menu stays open.
    Stepped(String),
}

fn resolve_option_event(event: OptionEvent, open: &Cell<bool>) -> String {
    match event {
        OptionEvent::Clicked(key) => {
            open.set(false);
            key
        }
        OptionEvent::Focused(key) | OptionEvent::Stepped(key) => key,
    }
}

/// Toolbar button with a drop-down option list.
///
/// The `open` flag is the only state the widget owns; everything else is
/// recreated from the item each frame.
pub struct ToolbarSelectButton {
    open: Rc<Cell<bool>>,
    handlers: ToolbarHandlers,
}

impl Default for ToolbarSelectButton {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolbarSelectButton {
    pub fn new() -> Self {
        Self {
            open: Rc::new(Cell::new(false)),
            handlers: ToolbarHandlers::new(),
        }
    }

    /// Draw the button (and its menu while open). Returns the key newly
    /// selected this frame, if any.
    pub fn show(&mut self, ui: &mut Ui, item: &SelectButtonItem) -> Option<String> {
        debug_assert!(unique_keys(&item.options), "duplicate option keys");

        let open = Rc::clone(&self.open);
        self.handlers.sync(move || open.set(!open.get()), item.disabled);

        let (rect, response) =
            ui.allocate_exact_size(vec2(TOOLBAR_HEIGHT + 10.0, TOOLBAR_HEIGHT), Sense::click());
        let is_open = self.open.get();
        {
            let label = item.display_label();
            let enabled = !item.disabled;
            response.widget_info(|| {
                WidgetInfo::selected(WidgetType::ComboBox, enabled, is_open, label.clone())
            });
        }

        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            if !item.disabled && (response.hovered() || response.has_focus() || is_open) {
                painter.rect_filled(rect, 2.0, ui.visuals().widgets.hovered.bg_fill);
            }
            let icon_color = if item.disabled {
                ui.visuals().weak_text_color().gamma_multiply(0.6)
            } else {
                ui.visuals().text_color()
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                item.icon,
                FontId::proportional(ICON_SIZE),
                icon_color,
            );
            if let Some(current) = item.current_option() {
                // Small status glyph in the corner, haloed so it stays
                // readable on any background.
                let overlay_size = ICON_SIZE * 0.6;
                let overlay_pos = pos2(
                    rect.right() - overlay_size * 0.65,
                    rect.bottom() - overlay_size * 0.65,
                );
                let halo = ui.visuals().panel_fill;
                for offset in [vec2(-1.0, 0.0), vec2(1.0, 0.0), vec2(0.0, -1.0), vec2(0.0, 1.0)] {
                    painter.text(
                        overlay_pos + offset,
                        Align2::CENTER_CENTER,
                        current.icon,
                        FontId::proportional(overlay_size),
                        halo,
                    );
                }
                painter.text(
                    overlay_pos,
                    Align2::CENTER_CENTER,
                    current.icon,
                    FontId::proportional(overlay_size),
                    ACCENT,
                );
            }
        }

        self.handlers.wire(&response);
        let response = response.on_hover_text(item.display_label());

        if self.open.get() && !item.disabled {
            self.show_menu(ui, &response, item)
        } else {
            None
        }
    }

    fn show_menu(&self, ui: &mut Ui, anchor: &Response, item: &SelectButtonItem) -> Option<String> {
        let mut picked = None;

        let area = egui::Area::new(anchor.id.with("menu"))
            .order(Order::Foreground)
            .fixed_pos(pos2(anchor.rect.left(), anchor.rect.bottom() + 4.0))
            .show(ui.ctx(), |ui| {
                Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_min_width(MENU_MIN_WIDTH);
                    for (index, option) in item.options.iter().enumerate() {
                        if let Some(event) = self.option_row(ui, item, option, index) {
                            picked = Some(resolve_option_event(event, &self.open));
                        }
                    }
                });
            });

        // Dismissal belongs to the popup, not the widget state machine.
        let ctx = ui.ctx().clone();
        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            self.open.set(false);
        }
        if ctx.input(|i| i.pointer.any_pressed()) {
            if let Some(pos) = ctx.input(|i| i.pointer.interact_pos()) {
                if !area.response.rect.contains(pos) && !anchor.rect.contains(pos) {
                    self.open.set(false);
                }
            }
        }

        picked
    }

    fn option_row(
        &self,
        ui: &mut Ui,
        item: &SelectButtonItem,
        option: &ToolbarOption,
        index: usize,
    ) -> Option<OptionEvent> {
        let selected = option.key == item.value;
        let width = ui.available_width().max(MENU_MIN_WIDTH);
        let (rect, response) = ui.allocate_exact_size(vec2(width, TOOLBAR_HEIGHT), Sense::click());
        {
            let label = option.label.clone();
            let enabled = !option.disabled;
            response.widget_info(|| {
                WidgetInfo::selected(WidgetType::SelectableLabel, enabled, selected, label.clone())
            });
        }

        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            if !option.disabled && (response.hovered() || response.has_focus()) {
                painter.rect_filled(rect, 2.0, ui.visuals().widgets.hovered.bg_fill);
            }
            if selected {
                // Thin marker bar flush with the left edge.
                let marker = egui::Rect::from_min_max(
                    pos2(rect.left() + 3.0, rect.top() + rect.height() / 8.0),
                    pos2(rect.left() + 6.0, rect.bottom() - rect.height() / 8.0),
                );
                painter.rect_filled(marker, 0.0, ACCENT);
            }
            let color = if option.disabled {
                ui.visuals().weak_text_color().gamma_multiply(0.6)
            } else {
                ui.visuals().text_color()
            };
            painter.text(
                pos2(rect.left() + 10.0 + ICON_SIZE / 2.0, rect.center().y),
                Align2::CENTER_CENTER,
                option.icon,
                FontId::proportional(ICON_SIZE),
                color,
            );
            painter.text(
                pos2(rect.left() + 16.0 + ICON_SIZE, rect.center().y),
                Align2::LEFT_CENTER,
                &option.label,
                FontId::proportional(13.0),
                color,
            );
        }

        // The selected option holds input focus while the list is open, so
        // arrow presses keep stepping from the current selection.
        if selected && !response.has_focus() {
            response.request_focus();
        }

        if option.disabled {
            return None;
        }
        if response.clicked() {
            return Some(OptionEvent::Clicked(option.key.clone()));
        }
        if response.gained_focus() {
            return Some(OptionEvent::Focused(option.key.clone()));
        }
        if response.has_focus() {
            if response
                .ctx
                .input_mut(|i| i.consume_key(Modifiers::NONE, Key::ArrowDown))
            {
                return step_option(&item.options, index, 1).map(OptionEvent::Stepped);
            }
            if response
                .ctx
                .input_mut(|i| i.consume_key(Modifiers::NONE, Key::ArrowUp))
            {
                return step_option(&item.options, index, -1).map(OptionEvent::Stepped);
            }
        }
        None
    }
}

/// Plain toolbar action button.
#[derive(Debug, Clone)]
pub struct ButtonItem {
    pub label: String,
    pub icon: &'static str,
    pub disabled: bool,
    /// Highlights the icon; used for on/off toggles.
    pub active: bool,
}

impl ButtonItem {
    pub fn new(label: impl Into<String>, icon: &'static str) -> Self {
        Self {
            label: label.into(),
            icon,
            disabled: false,
            active: false,
        }
    }
}

pub struct ToolbarButton {
    fired: Rc<Cell<bool>>,
    handlers: ToolbarHandlers,
}

impl Default for ToolbarButton {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolbarButton {
    pub fn new() -> Self {
        Self {
            fired: Rc::new(Cell::new(false)),
            handlers: ToolbarHandlers::new(),
        }
    }

    /// Draw the button; true when it was activated this frame.
    pub fn show(&mut self, ui: &mut Ui, item: &ButtonItem) -> bool {
        let fired = Rc::clone(&self.fired);
        self.handlers.sync(move || fired.set(true), item.disabled);

        let (rect, response) =
            ui.allocate_exact_size(vec2(TOOLBAR_HEIGHT, TOOLBAR_HEIGHT), Sense::click());
        {
            let label = item.label.clone();
            let enabled = !item.disabled;
            response
                .widget_info(|| WidgetInfo::labeled(WidgetType::Button, enabled, label.clone()));
        }

        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            if !item.disabled && (response.hovered() || response.has_focus()) {
                painter.rect_filled(rect, 2.0, ui.visuals().widgets.hovered.bg_fill);
            }
            let color = if item.disabled {
                ui.visuals().weak_text_color().gamma_multiply(0.6)
            } else if item.active {
                ACCENT
            } else {
                ui.visuals().text_color()
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                item.icon,
                FontId::proportional(ICON_SIZE),
                color,
            );
        }

        self.handlers.wire(&response);
        response.on_hover_text(&item.label);

        self.fired.take()
    }
}

/// Fixed-height strip the toolbar controls sit in.
pub fn toolbar_frame(ui: &mut Ui, add_contents: impl FnOnce(&mut Ui)) {
    Frame::none()
        .fill(ui.visuals().widgets.noninteractive.bg_fill)
        .rounding(2.0)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.set_height(TOOLBAR_HEIGHT);
                add_contents(ui);
            });
        });
}

/// Thin vertical divider between toolbar groups.
pub fn toolbar_splitter(ui: &mut Ui) {
    let (rect, _) = ui.allocate_exact_size(vec2(ICON_SIZE / 2.0, TOOLBAR_HEIGHT), Sense::hover());
    let x = rect.center().x;
    let margin = TOOLBAR_HEIGHT / 6.0;
    ui.painter().line_segment(
        [
            pos2(x, rect.top() + margin),
            pos2(x, rect.bottom() - margin),
        ],
        Stroke::new(1.0, Color32::from_gray(187).gamma_multiply(0.3)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(keys: &[&str]) -> Vec<ToolbarOption> {
        keys.iter()
            .map(|k| ToolbarOption::new(*k, "·", k.to_uppercase()))
            .collect()
    }

    fn counting_handlers(disabled: bool) -> (ToolbarHandlers, Rc<Cell<usize>>) {
        let handlers = ToolbarHandlers::new();
        let count = Rc::new(Cell::new(0usize));
        let c = Rc::clone(&count);
        handlers.sync(move || c.set(c.get() + 1), disabled);
        (handlers, count)
    }

    #[test]
    fn disabled_handlers_never_invoke_the_action() {
        let (handlers, count) = counting_handlers(true);
        handlers.activate();
        assert!(handlers.key_press(Key::Enter)); // handled, not invoked
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn enabled_handlers_invoke_on_pointer_and_trigger_key() {
        let (handlers, count) = counting_handlers(false);
        handlers.activate();
        assert!(handlers.key_press(Key::Enter));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn non_trigger_keys_are_not_handled() {
        let (handlers, count) = counting_handlers(false);
        assert!(!handlers.key_press(Key::A));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn custom_trigger_keys_replace_the_default() {
        let handlers = ToolbarHandlers::new().with_trigger_keys(vec![Key::Space]);
        let count = Rc::new(Cell::new(0usize));
        let c = Rc::clone(&count);
        handlers.sync(move || c.set(c.get() + 1), false);
        assert!(!handlers.key_press(Key::Enter));
        assert!(handlers.key_press(Key::Space));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn sync_always_exposes_the_latest_action() {
        let handlers = ToolbarHandlers::new();
        let first = Rc::new(Cell::new(0usize));
        let second = Rc::new(Cell::new(0usize));
        let f = Rc::clone(&first);
        handlers.sync(move || f.set(f.get() + 1), false);
        let s = Rc::clone(&second);
        handlers.sync(move || s.set(s.get() + 1), false);
        handlers.activate();
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn arrow_steps_are_cyclic() {
        let opts = options(&["a", "b", "c"]);
        // Down from b lands on c, then wraps to a.
        assert_eq!(step_option(&opts, 1, 1).as_deref(), Some("c"));
        assert_eq!(step_option(&opts, 2, 1).as_deref(), Some("a"));
        // Up from a wraps to c.
        assert_eq!(step_option(&opts, 0, -1).as_deref(), Some("c"));
    }

    #[test]
    fn n_down_steps_return_to_the_start() {
        let opts = options(&["a", "b", "c", "d"]);
        let mut index = 1;
        for _ in 0..opts.len() {
            let key = step_option(&opts, index, 1).unwrap();
            index = opts.iter().position(|o| o.key == key).unwrap();
        }
        assert_eq!(opts[index].key, "b");
    }

    #[test]
    fn stale_value_has_no_current_option_and_no_suffix() {
        let item = SelectButtonItem {
            label: "Engine".into(),
            icon: "⚙",
            disabled: false,
            options: options(&["a", "b"]),
            value: "gone".into(),
        };
        assert!(item.current_option().is_none());
        assert_eq!(item.display_label(), "Engine");
    }

    #[test]
    fn matching_value_appends_option_label() {
        let item = SelectButtonItem {
            label: "Engine".into(),
            icon: "⚙",
            disabled: false,
            options: options(&["a", "b"]),
            value: "b".into(),
        };
        assert_eq!(item.current_option().unwrap().key, "b");
        assert_eq!(item.display_label(), "Engine: B");
    }

    #[test]
    fn click_selection_closes_the_menu_but_stepping_does_not() {
        let open = Cell::new(true);
        let key = resolve_option_event(OptionEvent::Stepped("a".into()), &open);
        assert_eq!(key, "a");
        assert!(open.get());

        let key = resolve_option_event(OptionEvent::Focused("b".into()), &open);
        assert_eq!(key, "b");
        assert!(open.get());

        let key = resolve_option_event(OptionEvent::Clicked("c".into()), &open);
        assert_eq!(key, "c");
        assert!(!open.get());
    }

    #[test]
    fn option_keys_must_be_unique() {
        assert!(unique_keys(&options(&["a", "b"])));
        assert!(!unique_keys(&options(&["a", "a"])));
    }

    #[test]
    fn toggle_action_through_handlers_flips_open_state() {
        let open = Rc::new(Cell::new(false));
        let handlers = ToolbarHandlers::new();
        let flag = Rc::clone(&open);
        handlers.sync(move || flag.set(!flag.get()), false);

        handlers.activate();
        assert!(open.get());
        handlers.key_press(Key::Enter);
        assert!(!open.get());
    }
}
