//! Graphics and text state tracked while interpreting a content stream.
//!
//! `q`/`Q` save and restore the whole [`GraphicsState`], text parameters
//! included. The text matrix and text line matrix live outside the saved
//! state: they only exist between `BT` and `ET`.

use pdfpage_core::{Color, Ctm};

/// Text state parameters (`Tc`, `Tw`, `Tz`, `TL`, `Tf`, `Ts`).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextParams {
    pub font_name: String,
    pub font_size: f64,
    pub char_spacing: f64,
    pub word_spacing: f64,
    /// `Tz / 100`.
    pub horizontal_scaling: f64,
    pub leading: f64,
    pub rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            font_name: String::new(),
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// The saved part of the graphics state.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GraphicsState {
    pub ctm: Ctm,
    pub line_width: f64,
    pub stroke_color: Color,
    pub fill_color: Color,
    /// `/CA` from an ExtGState.
    pub stroke_alpha: f32,
    /// `/ca` from an ExtGState.
    pub fill_alpha: f32,
    pub text: TextParams,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Ctm::IDENTITY,
            line_width: 1.0,
            stroke_color: Color::BLACK,
            fill_color: Color::BLACK,
            stroke_alpha: 1.0,
            fill_alpha: 1.0,
            text: TextParams::default(),
        }
    }
}

impl GraphicsState {
    /// Stroke colour with the current stroke opacity applied.
    pub fn effective_stroke(&self) -> Color {
        self.stroke_color.with_alpha(self.stroke_alpha)
    }

    /// Fill colour with the current fill opacity applied.
    pub fn effective_fill(&self) -> Color {
        self.fill_color.with_alpha(self.fill_alpha)
    }
}

/// Full interpreter state: current graphics state, the `q` stack, and the
/// text object matrices.
#[derive(Debug, Clone)]
pub(crate) struct InterpreterState {
    current: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Ctm,
    line_matrix: Ctm,
}

impl InterpreterState {
    pub fn with_ctm(ctm: Ctm) -> Self {
        Self {
            current: GraphicsState {
                ctm,
                ..GraphicsState::default()
            },
            stack: Vec::new(),
            text_matrix: Ctm::IDENTITY,
            line_matrix: Ctm::IDENTITY,
        }
    }

    pub fn gs(&self) -> &GraphicsState {
        &self.current
    }

    pub fn gs_mut(&mut self) -> &mut GraphicsState {
        &mut self.current
    }

    pub fn ctm(&self) -> Ctm {
        self.current.ctm
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// `q`
    pub fn save(&mut self) {
        self.stack.push(self.current.clone());
    }

    /// `Q`. Returns `false` on an unbalanced restore, leaving the state as is.
    pub fn restore(&mut self) -> bool {
        match self.stack.pop() {
            Some(saved) => {
                self.current = saved;
                true
            }
            None => false,
        }
    }

    /// `cm`: pre-multiply the CTM.
    pub fn concat_matrix(&mut self, m: &Ctm) {
        self.current.ctm = m.concat(&self.current.ctm);
    }

    /// `BT`
    pub fn begin_text(&mut self) {
        self.text_matrix = Ctm::IDENTITY;
        self.line_matrix = Ctm::IDENTITY;
    }

    /// `Tm`
    pub fn set_text_matrix(&mut self, m: Ctm) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    /// `Td`: start of the next line, offset from the current line start.
    pub fn move_text_position(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Ctm::translate(tx, ty).concat(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// `T*`
    pub fn next_line(&mut self) {
        let leading = self.current.text.leading;
        self.move_text_position(0.0, -leading);
    }

    /// Move the text matrix along the baseline by `tx` text space units.
    pub fn advance(&mut self, tx: f64) {
        self.text_matrix = Ctm::translate(tx, 0.0).concat(&self.text_matrix);
    }

    /// Text rendering matrix: maps glyph space (scaled to em units) to
    /// page-point space.
    pub fn text_rendering_matrix(&self) -> Ctm {
        let t = &self.current.text;
        Ctm::new(
            t.font_size * t.horizontal_scaling,
            0.0,
            0.0,
            t.font_size,
            0.0,
            t.rise,
        )
        .concat(&self.text_matrix)
        .concat(&self.current.ctm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfpage_core::Point;

    #[test]
    fn save_restore_round_trips_state() {
        let mut st = InterpreterState::with_ctm(Ctm::IDENTITY);
        st.save();
        st.concat_matrix(&Ctm::translate(10.0, 20.0));
        st.gs_mut().line_width = 4.0;
        st.gs_mut().fill_color = Color::rgb(1.0, 0.0, 0.0);
        assert_eq!(st.depth(), 1);
        assert!(st.restore());
        assert_eq!(st.ctm(), Ctm::IDENTITY);
        assert_eq!(st.gs().line_width, 1.0);
        assert_eq!(st.gs().fill_color, Color::BLACK);
    }

    #[test]
    fn unbalanced_restore_is_reported() {
        let mut st = InterpreterState::with_ctm(Ctm::IDENTITY);
        st.gs_mut().line_width = 2.0;
        assert!(!st.restore());
        assert_eq!(st.gs().line_width, 2.0);
    }

    #[test]
    fn cm_premultiplies() {
        let mut st = InterpreterState::with_ctm(Ctm::IDENTITY);
        st.concat_matrix(&Ctm::translate(100.0, 0.0));
        st.concat_matrix(&Ctm::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0));
        // Scale applies in the translated space.
        let p = st.ctm().transform_point(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(102.0, 2.0));
    }

    #[test]
    fn td_and_t_star_move_line_start() {
        let mut st = InterpreterState::with_ctm(Ctm::IDENTITY);
        st.gs_mut().text.leading = 14.0;
        st.gs_mut().text.font_size = 1.0;
        st.begin_text();
        st.move_text_position(72.0, 700.0);
        st.advance(30.0);
        st.next_line();
        assert_eq!(st.text_rendering_matrix(), Ctm::translate(72.0, 686.0));
    }

    #[test]
    fn rendering_matrix_includes_size_scaling_and_rise() {
        let mut st = InterpreterState::with_ctm(Ctm::IDENTITY);
        {
            let t = &mut st.gs_mut().text;
            t.font_size = 10.0;
            t.horizontal_scaling = 0.5;
            t.rise = 3.0;
        }
        st.begin_text();
        st.set_text_matrix(Ctm::translate(50.0, 60.0));
        let trm = st.text_rendering_matrix();
        assert_eq!(trm, Ctm::new(5.0, 0.0, 0.0, 10.0, 50.0, 63.0));
    }

    #[test]
    fn opacity_applies_to_effective_colours() {
        let mut gs = GraphicsState::default();
        gs.fill_alpha = 0.5;
        assert_eq!(gs.effective_fill().a, 0.5);
        assert_eq!(gs.effective_stroke().a, 1.0);
    }
}
