//! Framebuffer Device Wrapper
//!
//! Maps the Linux framebuffer (`/dev/fb0`) into memory and draws into a back
//! buffer of the same layout. A frame only becomes visible on
//! [`Framebuffer::present`], so the screen never shows a half-drawn listing.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;

use anyhow::{Context, Result};
use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::{Rgb888, RgbColor},
    Pixel,
};
use tracing::{info, warn};

const FBIOGET_VSCREENINFO: libc::c_ulong = 0x4600;
const FBIOGET_FSCREENINFO: libc::c_ulong = 0x4602;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct FbBitField {
    offset: u32,
    length: u32,
    msb_right: u32,
}

/// `struct fb_var_screeninfo`
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct FbVarScreenInfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitField,
    green: FbBitField,
    blue: FbBitField,
    transp: FbBitField,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

/// `struct fb_fix_screeninfo`
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct FbFixScreenInfo {
    id: [u8; 16],
    smem_start: libc::c_ulong,
    smem_len: u32,
    fb_type: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: libc::c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

/// Byte layout of one pixel in video memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Bgra32,
    Rgba32,
    Bgr24,
    Rgb24,
    Rgb565,
}

impl PixelFormat {
    /// Pick the layout for a depth and blue channel offset.
    pub fn detect(bits_per_pixel: u32, blue_offset: u32) -> Option<Self> {
        match (bits_per_pixel, blue_offset) {
            (32, 0) => Some(Self::Bgra32),
            (32, _) => Some(Self::Rgba32),
            (24, 0) => Some(Self::Bgr24),
            (24, _) => Some(Self::Rgb24),
            (16, _) => Some(Self::Rgb565),
            _ => None,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgra32 | Self::Rgba32 => 4,
            Self::Bgr24 | Self::Rgb24 => 3,
            Self::Rgb565 => 2,
        }
    }

    /// Encode `color` into `out`, which holds exactly one pixel.
    pub fn encode(self, color: Rgb888, out: &mut [u8]) {
        match self {
            Self::Bgra32 => out.copy_from_slice(&[color.b(), color.g(), color.r(), 0xFF]),
            Self::Rgba32 => out.copy_from_slice(&[color.r(), color.g(), color.b(), 0xFF]),
            Self::Bgr24 => out.copy_from_slice(&[color.b(), color.g(), color.r()]),
            Self::Rgb24 => out.copy_from_slice(&[color.r(), color.g(), color.b()]),
            Self::Rgb565 => {
                let r = (color.r() >> 3) as u16;
                let g = (color.g() >> 2) as u16;
                let b = (color.b() >> 3) as u16;
                out.copy_from_slice(&((r << 11) | (g << 5) | b).to_le_bytes());
            }
        }
    }
}

/// Mapped framebuffer with a back buffer
pub struct Framebuffer {
    _file: File,
    mmap: *mut u8,
    mmap_len: usize,
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    back_buffer: Vec<u8>,
}

// SAFETY: The mmap pointer is only accessed through Framebuffer methods
unsafe impl Send for Framebuffer {}

impl Framebuffer {
    /// Open and map the framebuffer device
    pub fn new(path: &str) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open framebuffer device: {}", path))?;

        let fd = file.as_raw_fd();

        let mut var_info = FbVarScreenInfo::default();
        if unsafe { libc::ioctl(fd, FBIOGET_VSCREENINFO, &mut var_info) } < 0 {
            return Err(io::Error::last_os_error()).context("Failed to get variable screen info");
        }

        let mut fix_info = FbFixScreenInfo::default();
        if unsafe { libc::ioctl(fd, FBIOGET_FSCREENINFO, &mut fix_info) } < 0 {
            return Err(io::Error::last_os_error()).context("Failed to get fixed screen info");
        }

        let format = PixelFormat::detect(var_info.bits_per_pixel, var_info.blue.offset)
            .with_context(|| format!("Unsupported framebuffer depth: {} bpp", var_info.bits_per_pixel))?;
        let mmap_len = fix_info.smem_len as usize;

        info!(
            device = %path,
            width = var_info.xres,
            height = var_info.yres,
            bpp = var_info.bits_per_pixel,
            stride = fix_info.line_length,
            format = ?format,
            "Framebuffer opened"
        );

        let mmap = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                mmap_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        if mmap == libc::MAP_FAILED {
            return Err(io::Error::last_os_error()).context("Failed to mmap framebuffer");
        }

        Ok(Self {
            _file: file,
            mmap: mmap as *mut u8,
            mmap_len,
            width: var_info.xres,
            height: var_info.yres,
            stride: fix_info.line_length as usize,
            format,
            back_buffer: vec![0u8; mmap_len],
        })
    }

    fn pixel_offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride + x as usize * self.format.bytes_per_pixel()
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Rgb888) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = self.pixel_offset(x, y);
        let bpp = self.format.bytes_per_pixel();
        if let Some(out) = self.back_buffer.get_mut(offset..offset + bpp) {
            self.format.encode(color, out);
        }
    }

    /// Copy the back buffer to video memory
    pub fn present(&mut self) {
        unsafe {
            std::ptr::copy_nonoverlapping(
                self.back_buffer.as_ptr(),
                self.mmap,
                self.back_buffer.len().min(self.mmap_len),
            );
        }
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        if unsafe { libc::munmap(self.mmap as *mut libc::c_void, self.mmap_len) } != 0 {
            warn!(error = %io::Error::last_os_error(), "Failed to unmap framebuffer");
        }
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if coord.x >= 0 && coord.y >= 0 {
                self.set_pixel(coord.x as u32, coord.y as u32, color);
            }
        }
        Ok(())
    }

    /// Encode the color once and repeat it over every visible row.
    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let bpp = self.format.bytes_per_pixel();
        let mut pixel = [0u8; 4];
        self.format.encode(color, &mut pixel[..bpp]);

        let row_len = self.width as usize * bpp;
        for y in 0..self.height as usize {
            let start = y * self.stride;
            let Some(row) = self.back_buffer.get_mut(start..start + row_len) else {
                break;
            };
            for out in row.chunks_exact_mut(bpp) {
                out.copy_from_slice(&pixel[..bpp]);
            }
        }
        Ok(())
    }
}
