pub mod base64_frame_decoder;
