#![forbid(unsafe_code)]

//! The render primitive.
//!
//! A [`Painter`] is the only thing a sequencer talks to when it has placed an
//! item. Each call blocks until its output has been written; sequencers never
//! issue two calls at once.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType, ScrollUp};
use lscat_core::Config;

use crate::error::RenderError;
use crate::image::{
    DetectionHints, Image, ImageFit, ImageProtocol, Iterm2Options, KittyPlacement, detect_protocol,
};

/// Paints items onto the canvas.
pub trait Painter {
    /// Reset the canvas before the first item of a batch.
    fn clear(&mut self) -> Result<(), RenderError>;

    /// Scroll to a fresh page, `lines` lines down.
    fn page_break(&mut self, lines: u16) -> Result<(), RenderError>;

    /// Paint the image at `path` with its top-left corner at `(x, y)`,
    /// scaled to roughly `width` x `height` cells.
    fn render(
        &mut self,
        path: &Path,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> Result<(), RenderError>;

    /// Print text starting at `(x, y)`; each line of `text` goes one row lower.
    fn annotate(&mut self, x: u16, y: u16, text: &str) -> Result<(), RenderError>;
}

impl<P: Painter + ?Sized> Painter for &mut P {
    fn clear(&mut self) -> Result<(), RenderError> {
        (**self).clear()
    }

    fn page_break(&mut self, lines: u16) -> Result<(), RenderError> {
        (**self).page_break(lines)
    }

    fn render(
        &mut self,
        path: &Path,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> Result<(), RenderError> {
        (**self).render(path, x, y, width, height)
    }

    fn annotate(&mut self, x: u16, y: u16, text: &str) -> Result<(), RenderError> {
        (**self).annotate(x, y, text)
    }
}

impl<P: Painter + ?Sized> Painter for Box<P> {
    fn clear(&mut self) -> Result<(), RenderError> {
        (**self).clear()
    }

    fn page_break(&mut self, lines: u16) -> Result<(), RenderError> {
        (**self).page_break(lines)
    }

    fn render(
        &mut self,
        path: &Path,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> Result<(), RenderError> {
        (**self).render(path, x, y, width, height)
    }

    fn annotate(&mut self, x: u16, y: u16, text: &str) -> Result<(), RenderError> {
        (**self).annotate(x, y, text)
    }
}

/// Paints thumbnails into a terminal through an image protocol.
#[derive(Debug)]
pub struct TerminalPainter<W: Write> {
    out: W,
    protocol: ImageProtocol,
    thumbnail_px: u32,
}

impl TerminalPainter<io::Stdout> {
    /// Paint to stdout, detecting the protocol from the environment.
    pub fn stdout(config: &Config) -> Self {
        let protocol = detect_protocol(&DetectionHints::from_env());
        Self::new(io::stdout(), protocol, config.thumbnail_px)
    }
}

impl<W: Write> TerminalPainter<W> {
    pub fn new(out: W, protocol: ImageProtocol, thumbnail_px: u32) -> Self {
        Self {
            out,
            protocol,
            thumbnail_px,
        }
    }

    #[inline]
    pub fn protocol(&self) -> ImageProtocol {
        self.protocol
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint_image(
        &mut self,
        image: &Image,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> Result<(), RenderError> {
        match self.protocol {
            ImageProtocol::Kitty => {
                let chunks = image.encode_kitty(self.thumbnail_px, KittyPlacement::cells(width, height))?;
                queue!(self.out, MoveTo(x, y))?;
                for chunk in chunks {
                    self.out.write_all(chunk.as_bytes())?;
                }
            }
            ImageProtocol::Iterm2 => {
                let seq = image.encode_iterm2(self.thumbnail_px, &Iterm2Options::cells(width, height))?;
                queue!(self.out, MoveTo(x, y), Print(seq))?;
            }
            ImageProtocol::Ascii => {
                let lines = image.render_ascii(u32::from(width), u32::from(height), ImageFit::Contain);
                for (row, line) in (0u16..).zip(lines) {
                    queue!(self.out, MoveTo(x, y.saturating_add(row)), Print(line))?;
                }
            }
        }
        Ok(())
    }
}

impl<W: Write> Painter for TerminalPainter<W> {
    fn clear(&mut self) -> Result<(), RenderError> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        self.out.flush()?;
        Ok(())
    }

    fn page_break(&mut self, lines: u16) -> Result<(), RenderError> {
        queue!(self.out, ScrollUp(lines))?;
        self.out.flush()?;
        Ok(())
    }

    fn render(
        &mut self,
        path: &Path,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> Result<(), RenderError> {
        let bytes = fs::read(path)?;
        let image = Image::from_bytes(&bytes)?;
        self.paint_image(&image, x, y, width, height)?;
        self.out.flush()?;
        Ok(())
    }

    fn annotate(&mut self, x: u16, y: u16, text: &str) -> Result<(), RenderError> {
        for (row, line) in (0u16..).zip(text.lines()) {
            queue!(self.out, MoveTo(x, y.saturating_add(row)), Print(line))?;
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    fn png_file(dir: &Path) -> std::path::PathBuf {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(8, 8)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        let path = dir.join("000_square.png");
        fs::write(&path, bytes.into_inner()).unwrap();
        path
    }

    fn output(painter: TerminalPainter<Vec<u8>>) -> String {
        String::from_utf8(painter.into_inner()).unwrap()
    }

    #[test]
    fn clear_resets_screen_and_cursor() {
        let mut painter = TerminalPainter::new(Vec::new(), ImageProtocol::Ascii, 310);
        painter.clear().unwrap();
        let out = output(painter);
        assert!(out.contains("\x1b[2J"));
        assert!(out.ends_with("\x1b[1;1H"));
    }

    #[test]
    fn annotate_moves_to_each_line() {
        let mut painter = TerminalPainter::new(Vec::new(), ImageProtocol::Ascii, 310);
        painter.annotate(18, 9, "04\nartist").unwrap();
        assert_eq!(output(painter), "\x1b[10;19H04\x1b[11;19Hartist");
    }

    #[test]
    fn kitty_render_positions_then_transmits() {
        let dir = tempfile::tempdir().unwrap();
        let path = png_file(dir.path());
        let mut painter = TerminalPainter::new(Vec::new(), ImageProtocol::Kitty, 310);
        painter.render(&path, 2, 9, 18, 8).unwrap();
        let out = output(painter);
        assert!(out.starts_with("\x1b[10;3H\x1b_Ga=T,f=100,c=18,r=8,C=1,"));
    }

    #[test]
    fn iterm2_render_positions_then_transmits() {
        let dir = tempfile::tempdir().unwrap();
        let path = png_file(dir.path());
        let mut painter = TerminalPainter::new(Vec::new(), ImageProtocol::Iterm2, 310);
        painter.render(&path, 0, 0, 18, 8).unwrap();
        assert!(output(painter).starts_with("\x1b[1;1H\x1b]1337;File=inline=1;"));
    }

    #[test]
    fn ascii_render_draws_footprint_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = png_file(dir.path());
        let mut painter = TerminalPainter::new(Vec::new(), ImageProtocol::Ascii, 310);
        painter.render(&path, 2, 0, 4, 4).unwrap();
        let out = output(painter);
        assert_eq!(out.matches("\x1b[").count(), 4);
        assert!(out.starts_with("\x1b[1;3H"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut painter = TerminalPainter::new(Vec::new(), ImageProtocol::Ascii, 310);
        let err = painter
            .render(Path::new("/nonexistent/000_x.png"), 0, 0, 1, 1)
            .unwrap_err();
        assert!(matches!(err, RenderError::Io(_)));
    }

    #[test]
    fn non_image_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("001_notes.txt");
        fs::write(&path, b"plain text").unwrap();
        let mut painter = TerminalPainter::new(Vec::new(), ImageProtocol::Kitty, 310);
        assert!(matches!(
            painter.render(&path, 0, 0, 1, 1),
            Err(RenderError::Image(_))
        ));
    }
}
