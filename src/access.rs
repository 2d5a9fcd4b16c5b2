//! Pipeline stage and memory access algebra for global barriers.
//!
//! # Overview
//!
//! A pipeline barrier is described by a source and a destination [`Access`],
//! each pairing a [`vk::PipelineStageFlags2`] with a [`vk::AccessFlags2`].
//! [`GlobalBarrier`] carries such a pair, and its two constructors encode the
//! conservative defaults used when nothing is known about the surrounding
//! commands:
//!
//! - [`GlobalBarrier::before_operation`]: wait for all previous commands and
//!   make any prior write available before the operation's reads.
//! - [`GlobalBarrier::after_operation`]: make the operation's writes
//!   available and visible to any subsequent read at any stage.
//!
//! [`ReadAccess`] and [`WriteAccess`] restrict an access mask to read-only or
//! write-only bits, so an operation cannot accidentally declare a write where
//! a read mask is expected.

use ash::vk;

/// A pipeline stage paired with the memory access performed at that stage.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Access {
    pub stage: vk::PipelineStageFlags2,
    pub access: vk::AccessFlags2,
}

/// Every read bit defined by `VkAccessFlagBits2`, including extensions.
pub const ALL_READ_BITS: vk::AccessFlags2 = vk::AccessFlags2::from_raw(
    vk::AccessFlags2::INDIRECT_COMMAND_READ.as_raw()
        | vk::AccessFlags2::INDEX_READ.as_raw()
        | vk::AccessFlags2::VERTEX_ATTRIBUTE_READ.as_raw()
        | vk::AccessFlags2::UNIFORM_READ.as_raw()
        | vk::AccessFlags2::INPUT_ATTACHMENT_READ.as_raw()
        | vk::AccessFlags2::SHADER_READ.as_raw()
        | vk::AccessFlags2::COLOR_ATTACHMENT_READ.as_raw()
        | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ.as_raw()
        | vk::AccessFlags2::TRANSFER_READ.as_raw()
        | vk::AccessFlags2::HOST_READ.as_raw()
        | vk::AccessFlags2::MEMORY_READ.as_raw()
        | vk::AccessFlags2::SHADER_SAMPLED_READ.as_raw()
        | vk::AccessFlags2::SHADER_STORAGE_READ.as_raw()
        | vk::AccessFlags2::VIDEO_DECODE_READ_KHR.as_raw()
        | vk::AccessFlags2::VIDEO_ENCODE_READ_KHR.as_raw()
        | vk::AccessFlags2::TRANSFORM_FEEDBACK_COUNTER_READ_EXT.as_raw()
        | vk::AccessFlags2::CONDITIONAL_RENDERING_READ_EXT.as_raw()
        | vk::AccessFlags2::COMMAND_PREPROCESS_READ_NV.as_raw()
        | vk::AccessFlags2::ACCELERATION_STRUCTURE_READ_KHR.as_raw()
        | vk::AccessFlags2::FRAGMENT_DENSITY_MAP_READ_EXT.as_raw()
        | vk::AccessFlags2::COLOR_ATTACHMENT_READ_NONCOHERENT_EXT.as_raw()
        | vk::AccessFlags2::DESCRIPTOR_BUFFER_READ_EXT.as_raw()
        | vk::AccessFlags2::INVOCATION_MASK_READ_HUAWEI.as_raw()
        | vk::AccessFlags2::SHADER_BINDING_TABLE_READ_KHR.as_raw()
        | vk::AccessFlags2::MICROMAP_READ_EXT.as_raw()
        | vk::AccessFlags2::OPTICAL_FLOW_READ_NV.as_raw(),
);

/// Every write bit defined by `VkAccessFlagBits2`, including extensions.
pub const ALL_WRITE_BITS: vk::AccessFlags2 = vk::AccessFlags2::from_raw(
    vk::AccessFlags2::SHADER_WRITE.as_raw()
        | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE.as_raw()
        | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE.as_raw()
        | vk::AccessFlags2::TRANSFER_WRITE.as_raw()
        | vk::AccessFlags2::HOST_WRITE.as_raw()
        | vk::AccessFlags2::MEMORY_WRITE.as_raw()
        | vk::AccessFlags2::SHADER_STORAGE_WRITE.as_raw()
        | vk::AccessFlags2::VIDEO_DECODE_WRITE_KHR.as_raw()
        | vk::AccessFlags2::VIDEO_ENCODE_WRITE_KHR.as_raw()
        | vk::AccessFlags2::TRANSFORM_FEEDBACK_WRITE_EXT.as_raw()
        | vk::AccessFlags2::TRANSFORM_FEEDBACK_COUNTER_WRITE_EXT.as_raw()
        | vk::AccessFlags2::COMMAND_PREPROCESS_WRITE_NV.as_raw()
        | vk::AccessFlags2::ACCELERATION_STRUCTURE_WRITE_KHR.as_raw()
        | vk::AccessFlags2::MICROMAP_WRITE_EXT.as_raw()
        | vk::AccessFlags2::OPTICAL_FLOW_WRITE_NV.as_raw(),
);

/// An access mask restricted to read bits.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ReadAccess(vk::AccessFlags2);

impl ReadAccess {
    /// All read bits.
    pub const ANY: ReadAccess = ReadAccess(ALL_READ_BITS);

    /// Wraps a read-only access mask.
    ///
    /// Debug builds assert that `access` contains no write bits.
    pub fn new(access: vk::AccessFlags2) -> Self {
        debug_assert!(
            ALL_READ_BITS.contains(access),
            "access mask {access:?} contains non-read bits"
        );
        Self(access)
    }

    pub fn flags(self) -> vk::AccessFlags2 {
        self.0
    }
}

/// An access mask restricted to write bits.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct WriteAccess(vk::AccessFlags2);

impl WriteAccess {
    /// All write bits.
    pub const ANY: WriteAccess = WriteAccess(ALL_WRITE_BITS);

    /// Wraps a write-only access mask.
    ///
    /// Debug builds assert that `access` contains no read bits.
    pub fn new(access: vk::AccessFlags2) -> Self {
        debug_assert!(
            ALL_WRITE_BITS.contains(access),
            "access mask {access:?} contains non-write bits"
        );
        Self(access)
    }

    pub fn flags(self) -> vk::AccessFlags2 {
        self.0
    }
}

/// A global (non-resource-specific) memory barrier.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GlobalBarrier {
    pub src: Access,
    pub dst: Access,
}

impl GlobalBarrier {
    /// The conservative barrier recorded at the beginning of an operation.
    ///
    /// We do not know which commands came before, so all previous commands
    /// must finish and any prior write is made available before the
    /// operation's read access becomes visible at `destination_stage`.
    pub fn before_operation(
        destination_stage: vk::PipelineStageFlags2,
        destination_access: Option<ReadAccess>,
    ) -> Self {
        Self {
            src: Access {
                stage: vk::PipelineStageFlags2::ALL_COMMANDS,
                access: ALL_WRITE_BITS,
            },
            dst: Access {
                stage: destination_stage,
                access: destination_access
                    .map(ReadAccess::flags)
                    .unwrap_or(vk::AccessFlags2::empty()),
            },
        }
    }

    /// The conservative barrier recorded at the end of an operation.
    ///
    /// We do not know which commands come after, so all subsequent stages
    /// wait for `source_stage` and the operation's writes are made available
    /// and visible to any read access.
    pub fn after_operation(
        source_stage: vk::PipelineStageFlags2,
        source_access: Option<WriteAccess>,
    ) -> Self {
        Self {
            src: Access {
                stage: source_stage,
                access: source_access
                    .map(WriteAccess::flags)
                    .unwrap_or(vk::AccessFlags2::empty()),
            },
            dst: Access {
                stage: vk::PipelineStageFlags2::ALL_COMMANDS,
                access: ALL_READ_BITS,
            },
        }
    }
}
