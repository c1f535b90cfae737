pub mod attribute;
pub mod error;
pub mod events;
pub mod id;
pub mod model;
pub mod status;

pub use attribute::{
    AttributeKind, ComponentSetting, is_plain_file_name, parse_component_config, rest_sub_path,
};
pub use error::{CoreError, ErrorCategory, Result};
pub use events::{BusMessage, EventBus, PodDetails};
pub use id::{CallerId, RecordId};
pub use model::{
    AppRecord, Attribute, AttributeOwner, ControllerService, RecordKind, parse_name_list,
};
pub use status::{BackendCode, BackendStatus, STATUS_OK};
