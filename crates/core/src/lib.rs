pub mod clustering {
    pub mod domain {
        pub mod cluster_enhancer;
        pub mod hierarchical_clusterer;
        pub mod photo_cluster;
    }
}

pub mod features {
    pub mod domain {
        pub mod color_histogram;
        pub mod composition;
        pub mod feature_extractor;
        pub mod grouping_features;
        pub mod pixel_decoder;
        pub mod scene_complexity;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod capabilities;
    pub mod group_photos_use_case;
    pub mod grouping_error;
    pub mod grouping_options;
    pub mod grouping_progress;
    pub mod infrastructure;
    pub mod memory_monitor;
    pub mod photo_catalog;
    pub mod progress_registry;
    pub mod retry_policy;
    pub mod stage_timings;
}

pub mod shared {
    pub mod constants;
    pub mod face_box;
    pub mod photo;
    pub mod pixel_buffer;
}

pub mod similarity {
    pub mod domain {
        pub mod similarity_matrix;
        pub mod similarity_scorer;
        pub mod similarity_weights;
    }
}
