pub mod head_pose;
pub mod policy;
pub mod verdict;
