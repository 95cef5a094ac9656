// SPDX-License-Identifier: GPL-3.0-only

//! File-backed video encoder
//!
//! The recording loop feeds RGB frames into a GStreamer pipeline:
//! `appsrc -> videoconvert -> jpegenc -> avimux -> filesink`, an MJPEG
//! stream in an AVI container at a fixed declared frame rate.
//!
//! The `RecordingSink` trait is the seam between the session's
//! recording state machine and the encoder, so tests can record into a
//! mock sink without GStreamer plugins.

use crate::errors::RecordingError;
use crate::frame::Frame;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::AppSrc;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Where the recording loop writes its frames
pub trait RecordingSink: Send {
    /// Dimensions the sink expects; frames are resized to this before
    /// writing.
    fn dimensions(&self) -> (u32, u32);

    /// Append one frame.
    fn write_frame(&mut self, frame: &Frame) -> Result<(), RecordingError>;

    /// Flush and close the output. Idempotent.
    fn finish(&mut self) -> Result<(), RecordingError>;
}

/// GStreamer-backed MJPEG/AVI sink
pub struct GstAviSink {
    pipeline: gst::Pipeline,
    appsrc: AppSrc,
    width: u32,
    height: u32,
    finished: bool,
}

impl GstAviSink {
    /// Build the encoder pipeline and bring it to `Playing`.
    ///
    /// Fails with `EncoderInit` when an element is missing or the
    /// output file cannot be created; the pipeline is left torn down.
    pub fn create(path: &Path, width: u32, height: u32, fps: u32) -> Result<Self, RecordingError> {
        gst::init().map_err(|e| RecordingError::EncoderInit(format!("GStreamer init: {}", e)))?;

        info!(
            path = %path.display(),
            width,
            height,
            fps,
            "Creating video encoder pipeline"
        );

        let pipeline = gst::Pipeline::new();

        let appsrc = gst::ElementFactory::make("appsrc")
            .name("recording_src")
            .build()
            .map_err(|e| RecordingError::EncoderInit(format!("appsrc: {}", e)))?;

        let videoconvert = gst::ElementFactory::make("videoconvert")
            .build()
            .map_err(|e| RecordingError::EncoderInit(format!("videoconvert: {}", e)))?;

        let jpegenc = gst::ElementFactory::make("jpegenc")
            .build()
            .map_err(|e| RecordingError::EncoderInit(format!("jpegenc: {}", e)))?;

        let avimux = gst::ElementFactory::make("avimux")
            .build()
            .map_err(|e| RecordingError::EncoderInit(format!("avimux: {}", e)))?;

        let filesink = gst::ElementFactory::make("filesink")
            .property("location", path.to_string_lossy().as_ref())
            .build()
            .map_err(|e| RecordingError::EncoderInit(format!("filesink: {}", e)))?;

        let appsrc = appsrc
            .downcast::<AppSrc>()
            .map_err(|_| RecordingError::EncoderInit("appsrc downcast".to_string()))?;

        let caps = gst::Caps::builder("video/x-raw")
            .field("format", "RGB")
            .field("width", width as i32)
            .field("height", height as i32)
            .field("framerate", gst::Fraction::new(fps as i32, 1))
            .build();

        appsrc.set_caps(Some(&caps));
        appsrc.set_format(gst::Format::Time);
        appsrc.set_is_live(true);
        appsrc.set_do_timestamp(true);

        pipeline
            .add_many([
                appsrc.upcast_ref(),
                &videoconvert,
                &jpegenc,
                &avimux,
                &filesink,
            ])
            .map_err(|e| RecordingError::EncoderInit(format!("add elements: {}", e)))?;

        gst::Element::link_many([
            appsrc.upcast_ref(),
            &videoconvert,
            &jpegenc,
            &avimux,
            &filesink,
        ])
        .map_err(|e| RecordingError::EncoderInit(format!("link elements: {}", e)))?;

        pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| RecordingError::EncoderInit(format!("start pipeline: {}", e)))?;

        // Wait for the state change so a bad output path fails here,
        // not on the first frame
        let (result, _state, _pending) = pipeline.state(gst::ClockTime::from_seconds(5));
        if result.is_err() {
            let _ = pipeline.set_state(gst::State::Null);
            return Err(RecordingError::EncoderInit(
                "pipeline failed to reach Playing state".to_string(),
            ));
        }

        Ok(Self {
            pipeline,
            appsrc,
            width,
            height,
            finished: false,
        })
    }
}

impl RecordingSink for GstAviSink {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<(), RecordingError> {
        if self.finished {
            return Err(RecordingError::Pipeline("sink already finished".to_string()));
        }

        let expected = (self.width as usize) * (self.height as usize) * 3;
        if frame.data().len() != expected {
            return Err(RecordingError::Pipeline(format!(
                "frame size {}x{} does not match encoder {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }

        let mut buffer = gst::Buffer::with_size(expected)
            .map_err(|e| RecordingError::Pipeline(format!("allocate buffer: {}", e)))?;

        {
            let buffer_ref = buffer
                .get_mut()
                .ok_or_else(|| RecordingError::Pipeline("buffer not writable".to_string()))?;
            let mut map = buffer_ref
                .map_writable()
                .map_err(|e| RecordingError::Pipeline(format!("map buffer: {}", e)))?;
            map.copy_from_slice(frame.data());
        }

        self.appsrc
            .push_buffer(buffer)
            .map_err(|e| RecordingError::Pipeline(format!("push frame: {:?}", e)))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), RecordingError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        debug!("Finalizing video encoder");

        self.appsrc
            .end_of_stream()
            .map_err(|e| RecordingError::Pipeline(format!("send EOS: {:?}", e)))?;

        // Drain the bus so the muxer writes its index before teardown
        if let Some(bus) = self.pipeline.bus() {
            use gst::MessageView;
            if let Some(msg) = bus.timed_pop_filtered(
                gst::ClockTime::from_seconds(3),
                &[gst::MessageType::Eos, gst::MessageType::Error],
            ) {
                if let MessageView::Error(err) = msg.view() {
                    warn!(error = %err.error(), "Encoder reported an error during finalize");
                }
            }
        }

        self.pipeline
            .set_state(gst::State::Null)
            .map_err(|e| RecordingError::Pipeline(format!("stop pipeline: {}", e)))?;

        info!("Video encoder finalized");
        Ok(())
    }
}

impl Drop for GstAviSink {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.finish() {
                error!(error = %e, "Failed to finalize encoder on drop");
            }
        }
    }
}
