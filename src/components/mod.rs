pub mod topic_map;
