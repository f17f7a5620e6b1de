pub mod classify_frame_use_case;
pub mod verify_face_use_case;
